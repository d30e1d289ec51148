//! Process-wide runtime options consulted by the analysis.

use std::sync::atomic::{AtomicBool, Ordering};

static ARRAY_KEY_NOTICES: AtomicBool = AtomicBool::new(false);

/// Whether lossy array-key coercions (double, bool, null, resource keys)
/// raise a notice in the modeled runtime. When enabled, key disection marks
/// such accesses as possibly throwing.
pub fn array_key_notices() -> bool {
    ARRAY_KEY_NOTICES.load(Ordering::Relaxed)
}

/// Set the array-key notice mode. Expected to be called once during
/// configuration, before analysis starts.
pub fn set_array_key_notices(enabled: bool) {
    ARRAY_KEY_NOTICES.store(enabled, Ordering::Relaxed);
}
