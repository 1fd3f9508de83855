//! Wall-clock labels for save slots

/// Produces the localized date/time shown next to a save
pub trait Clock {
    fn now_label(&self) -> String;
}

/// Local time from the host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

/// Uses the browser locale, e.g. "Oct 17, 2026, 3:04:05 PM"
#[cfg(target_arch = "wasm32")]
impl Clock for SystemClock {
    fn now_label(&self) -> String {
        use wasm_bindgen::JsValue;

        let options = js_sys::Object::new();
        for (key, value) in [
            ("hour", "numeric"),
            ("minute", "numeric"),
            ("second", "numeric"),
            ("year", "numeric"),
            ("month", "short"),
            ("day", "numeric"),
        ] {
            let _ = js_sys::Reflect::set(&options, &JsValue::from_str(key), &JsValue::from_str(value));
        }

        let date = js_sys::Date::new_0();
        date.to_locale_string("default", &options).into()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_label(&self) -> String {
        chrono::Local::now()
            .format("%b %-d, %Y, %-I:%M:%S %p")
            .to_string()
    }
}

/// Always returns the same label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedClock(pub String);

impl FixedClock {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }
}

impl Clock for FixedClock {
    fn now_label(&self) -> String {
        self.0.clone()
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_label_shape() {
        let label = SystemClock.now_label();
        // "Mon D, YYYY, H:MM:SS AM"
        assert!(label.ends_with("AM") || label.ends_with("PM"), "{label}");
        assert_eq!(label.matches(',').count(), 2, "{label}");
    }

    #[test]
    fn test_fixed_clock() {
        assert_eq!(FixedClock::new("noon").now_label(), "noon");
    }
}
