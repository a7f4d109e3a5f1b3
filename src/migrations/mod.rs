mod m000001;

use m000001::M000001_MIGRATION;

/// Ordered migration scripts. Each entry is a list of statements applied in
/// one transaction. The `:WINDLASS_*` placeholders are replaced with
/// configured, individually-escaped identifiers before execution — index
/// names included, since a quoted table name cannot be spliced into an
/// index name after the fact.
pub(crate) const MIGRATIONS: &[&[&str]] = &[M000001_MIGRATION];
