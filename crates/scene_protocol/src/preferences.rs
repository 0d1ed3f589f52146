//! Host-owned configuration, queried once at `Drawing::new` per spec.md
//! §10.4: number of worker threads, cache byte budget, outline colors, and
//! default filter quality all come from here rather than being hardcoded.

/// Queried by `drawing::Drawing::new` for every tunable the core needs at
/// startup. A host with no preference store of its own can implement this
/// over a handful of constants.
pub trait Preferences {
    /// Reads an integer preference at `path`, clamped to `[min, max]`.
    fn int(&self, path: &str, min: i32, max: i32) -> i32;

    /// Reads a packed 0xAARRGGBB color preference at `path`.
    fn color(&self, path: &str) -> u32;
}

/// A `Preferences` implementation backed by fixed defaults, for hosts and
/// tests that have no preference store. Matches spec.md §5's stated
/// defaults (1 worker thread, 64 MiB cache budget).
pub struct DefaultPreferences;

impl Preferences for DefaultPreferences {
    fn int(&self, path: &str, min: i32, max: i32) -> i32 {
        let default = match path {
            "rendering/num-threads" => 1,
            "rendering/cache-budget-mb" => 64,
            "rendering/filter-quality" => 2,
            _ => min,
        };
        default.clamp(min, max)
    }

    fn color(&self, path: &str) -> u32 {
        match path {
            "rendering/outline-color" => 0xff_00_00_ff,
            _ => 0xff_00_00_00,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preferences_clamp_num_threads() {
        let prefs = DefaultPreferences;
        assert_eq!(prefs.int("rendering/num-threads", 1, 256), 1);
    }

    #[test]
    fn unknown_path_falls_back_to_min() {
        let prefs = DefaultPreferences;
        assert_eq!(prefs.int("unknown/path", 5, 10), 5);
    }
}
