//! Maps `Box<dyn Error>` from trait boundaries to typed `DriveError`.
//!
//! The traits in `diffdrive_traits` use `Box<dyn Error + Send + Sync>` for
//! maximum flexibility; this module converts those to our typed error enum,
//! with an optional feature-gated path for `diffdrive_hardware::HwError`.

use crate::error::DriveError;

/// Map a trait-boundary error to a typed `DriveError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> DriveError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<diffdrive_hardware::error::HwError>() {
            use diffdrive_hardware::error::HwError;
            return match hw {
                HwError::Timeout => DriveError::Timeout,
                HwError::Serial(msg) => DriveError::Link(msg.clone()),
                HwError::Io(io) => DriveError::Io(io.to_string()),
                other => DriveError::HardwareFault(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        DriveError::Timeout
    } else {
        DriveError::Hardware(s)
    }
}

/// Same as [`map_hw_error`] for the boxed form returned by collaborator traits.
pub fn map_hw_error_dyn(e: &(dyn std::error::Error + Send + Sync + 'static)) -> DriveError {
    map_hw_error(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_text_maps_to_timeout() {
        let e: Box<dyn std::error::Error + Send + Sync> = "uart read timeout".into();
        assert!(matches!(map_hw_error_dyn(&*e), DriveError::Timeout));
    }

    #[test]
    fn other_text_maps_to_hardware() {
        let e: Box<dyn std::error::Error + Send + Sync> = "pwm channel busy".into();
        match map_hw_error_dyn(&*e) {
            DriveError::Hardware(msg) => assert!(msg.contains("pwm")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn typed_hw_errors_downcast() {
        use diffdrive_hardware::error::HwError;
        let e: Box<dyn std::error::Error + Send + Sync> = Box::new(HwError::Gpio("pin 5".into()));
        assert!(matches!(map_hw_error_dyn(&*e), DriveError::HardwareFault(_)));
        let e: Box<dyn std::error::Error + Send + Sync> =
            Box::new(HwError::Serial("port gone".into()));
        assert!(matches!(map_hw_error_dyn(&*e), DriveError::Link(_)));
    }
}
