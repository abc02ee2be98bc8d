//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! # Exit Codes
//!
//! | Code | Domain    | Description                                          |
//! |------|-----------|------------------------------------------------------|
//! | 0    | Universal | Success                                              |
//! | 1    | Universal | General error (unspecified)                          |
//! | 2    | Universal | CLI usage error (bad args, bad `FIELD=VALUE`)        |
//! | 3    | config    | Config file unreadable, unparsable or invalid        |
//! | 4    | source    | Data file unreadable, unparsable or not appendable   |
//! | 5    | alerts    | Critical alerts present (`--fail-on critical/warning`) |
//! | 6    | alerts    | Warnings present, no criticals (`--fail-on warning`) |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use stockroom_recon::StockError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Config + sources (3-4)
// =============================================================================

/// Config file could not be read, parsed, or failed validation.
pub const EXIT_CONFIG_INVALID: u8 = 3;

/// A catalog / inbound / outbound file could not be read, parsed or appended to.
pub const EXIT_SOURCE: u8 = 4;

// =============================================================================
// Alerts (5-6), only with --fail-on
// =============================================================================

/// At least one critical alert.
pub const EXIT_ALERTS_CRITICAL: u8 = 5;

/// Warnings but no critical alerts (`--fail-on warning` only).
pub const EXIT_ALERTS_WARNING: u8 = 6;

/// Map an engine-side error to its exit code.
pub fn stock_exit_code(err: &StockError) -> u8 {
    match err {
        StockError::ConfigParse(_) | StockError::ConfigValidation(_) => EXIT_CONFIG_INVALID,
        StockError::Io { .. }
        | StockError::Parse { .. }
        | StockError::UnsupportedFormat(_)
        | StockError::MissingHeader(_) => EXIT_SOURCE,
    }
}
