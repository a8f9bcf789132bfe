//! Default GPIO assignments (BCM numbering).
//!
//! Single source of truth for the startup defaults.  Every pin can be
//! overridden through [`LedConfig`](crate::config::LedConfig).

// ---------------------------------------------------------------------------
// Buttons (momentary, rising edge on press)
// ---------------------------------------------------------------------------

/// Decrease-brightness button.
pub const DOWN_BUTTON_GPIO: u32 = 23;
/// Increase-brightness button.
pub const UP_BUTTON_GPIO: u32 = 24;

// ---------------------------------------------------------------------------
// LED output
// ---------------------------------------------------------------------------

/// Software-PWM driven LED.
pub const LED_GPIO: u32 = 18;

// ---------------------------------------------------------------------------
// Controller geometry
// ---------------------------------------------------------------------------

/// Number of lines on the BCM283x GPIO bank.
pub const GPIO_COUNT: u32 = 54;
