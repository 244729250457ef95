//! CLI exit code registry.
//!
//! Single source of truth for the shell contract; pipelines gate on these.
//!
//! | Code | Meaning                                             |
//! |------|-----------------------------------------------------|
//! | 0    | Success, every group resolved                       |
//! | 2    | Usage or config error (bad TOML, failed validation) |
//! | 3    | Runtime error (IO, parse, data/config mismatch)     |
//! | 4    | Run completed but unresolved values remain          |

/// Success - run completed and every group resolved.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage or config error - bad TOML, failed validation.
pub const EXIT_CONFIG: u8 = 2;

/// Runtime error - IO, CSV parse, data/config mismatch.
pub const EXIT_RUNTIME: u8 = 3;

/// Run completed but some groups exhausted every fallback.
/// The cleaned CSV is still written; the audit lists the rows.
pub const EXIT_UNRESOLVED: u8 = 4;
