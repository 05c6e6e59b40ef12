#![forbid(unsafe_code)]

//! Environment snapshots.
//!
//! An [`Environment`] is an immutable, copy-on-write map from typed keys to
//! values, passed down the view tree. Overriding a value produces a new
//! snapshot for the descendants of the overriding node only; siblings and
//! ancestors keep seeing the old one. Reading a key that was never set
//! yields the key's documented default.
//!
//! ```
//! use weft_runtime::environment::{AppearanceKey, Environment};
//! use weft_runtime::theme::Appearance;
//!
//! let root = Environment::new();
//! assert_eq!(root.get::<AppearanceKey>(), Appearance::Dark);
//!
//! let child = root.with::<AppearanceKey>(Appearance::Light);
//! assert_eq!(child.get::<AppearanceKey>(), Appearance::Light);
//! assert_eq!(root.get::<AppearanceKey>(), Appearance::Dark);
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::theme::{Appearance, Palette};

/// A typed environment key with a default value.
pub trait EnvironmentKey: 'static {
    /// Value stored under this key.
    type Value: Clone + 'static;

    /// Value returned when the key is absent.
    fn default_value() -> Self::Value;
}

/// Immutable copy-on-write key/value snapshot.
#[derive(Clone, Default)]
pub struct Environment {
    values: Rc<HashMap<TypeId, Rc<dyn Any>>>,
}

impl Environment {
    /// An empty environment (every key reads as its default).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `K`, or `K::default_value()` when absent.
    #[must_use]
    pub fn get<K: EnvironmentKey>(&self) -> K::Value {
        self.values
            .get(&TypeId::of::<K>())
            .and_then(|value| value.downcast_ref::<K::Value>())
            .cloned()
            .unwrap_or_else(K::default_value)
    }

    /// Whether `K` was explicitly set.
    #[must_use]
    pub fn contains<K: EnvironmentKey>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<K>())
    }

    /// A new snapshot with `K` set to `value`. `self` is unchanged.
    #[must_use]
    pub fn with<K: EnvironmentKey>(&self, value: K::Value) -> Self {
        let mut next = self.clone();
        next.set::<K>(value);
        next
    }

    /// Set `K` in this snapshot, copying the map only if it is shared.
    pub fn set<K: EnvironmentKey>(&mut self, value: K::Value) {
        Rc::make_mut(&mut self.values).insert(TypeId::of::<K>(), Rc::new(value));
    }

    /// Number of explicitly set keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// No keys set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Palette and appearance ids, compared frame to frame.
    #[must_use]
    pub fn fingerprint(&self) -> EnvFingerprint {
        EnvFingerprint {
            palette: self.get::<PaletteKey>().id,
            appearance: self.get::<AppearanceKey>(),
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("keys", &self.values.len())
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// Identity of the styling inputs. A change purges memoized renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvFingerprint {
    /// Active palette id.
    pub palette: &'static str,
    /// Active appearance.
    pub appearance: Appearance,
}

/// Active palette. Default: the first built-in palette.
#[derive(Debug)]
pub struct PaletteKey;

impl EnvironmentKey for PaletteKey {
    type Value = Palette;
    fn default_value() -> Palette {
        Palette::default()
    }
}

/// Active appearance. Default: [`Appearance::Dark`].
#[derive(Debug)]
pub struct AppearanceKey;

impl EnvironmentKey for AppearanceKey {
    type Value = Appearance;
    fn default_value() -> Appearance {
        Appearance::Dark
    }
}

/// Id of the focused target at frame start. Default: none.
#[derive(Debug)]
pub struct FocusedIdKey;

impl EnvironmentKey for FocusedIdKey {
    type Value = Option<Rc<str>>;
    fn default_value() -> Self::Value {
        None
    }
}

/// Id of the active focus section at frame start. Default: none.
#[derive(Debug)]
pub struct ActiveSectionKey;

impl EnvironmentKey for ActiveSectionKey {
    type Value = Option<Rc<str>>;
    fn default_value() -> Self::Value {
        None
    }
}

/// Terminal size as (columns, rows). Default: (80, 24).
#[derive(Debug)]
pub struct TerminalSizeKey;

impl EnvironmentKey for TerminalSizeKey {
    type Value = (u16, u16);
    fn default_value() -> (u16, u16) {
        (80, 24)
    }
}

/// Animation counters. Default: both zero.
#[derive(Debug)]
pub struct AnimationTicksKey;

/// Tick counts of the fast and slow animation timers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimationTicks {
    /// Fast timer ticks since start.
    pub fast: u64,
    /// Slow timer ticks since start.
    pub slow: u64,
}

impl EnvironmentKey for AnimationTicksKey {
    type Value = AnimationTicks;
    fn default_value() -> AnimationTicks {
        AnimationTicks::default()
    }
}

/// Index of the frame being rendered. Default: 0.
#[derive(Debug)]
pub struct FrameIndexKey;

impl EnvironmentKey for FrameIndexKey {
    type Value = u64;
    fn default_value() -> u64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Greeting;

    impl EnvironmentKey for Greeting {
        type Value = String;
        fn default_value() -> String {
            "hello".into()
        }
    }

    #[test]
    fn missing_key_reads_default() {
        let env = Environment::new();
        assert_eq!(env.get::<Greeting>(), "hello");
        assert!(!env.contains::<Greeting>());
        assert_eq!(env.get::<TerminalSizeKey>(), (80, 24));
    }

    #[test]
    fn override_affects_only_the_new_snapshot() {
        let parent = Environment::new().with::<Greeting>("hi".into());
        let child = parent.with::<Greeting>("hey".into());
        let sibling = parent.clone();
        assert_eq!(child.get::<Greeting>(), "hey");
        assert_eq!(parent.get::<Greeting>(), "hi");
        assert_eq!(sibling.get::<Greeting>(), "hi");
    }

    #[test]
    fn set_copies_only_when_shared() {
        let mut env = Environment::new();
        env.set::<FrameIndexKey>(1);
        let snapshot = env.clone();
        env.set::<FrameIndexKey>(2);
        assert_eq!(snapshot.get::<FrameIndexKey>(), 1);
        assert_eq!(env.get::<FrameIndexKey>(), 2);
        assert_eq!(env.len(), 1);
    }

    #[test]
    fn fingerprint_tracks_palette_and_appearance() {
        let env = Environment::new();
        let base = env.fingerprint();
        let light = env.with::<AppearanceKey>(Appearance::Light);
        assert_ne!(light.fingerprint(), base);

        let other = Palette::builtin().into_iter().nth(1).unwrap();
        let swapped = env.with::<PaletteKey>(other);
        assert_ne!(swapped.fingerprint().palette, base.palette);

        let unrelated = env.with::<FrameIndexKey>(7);
        assert_eq!(unrelated.fingerprint(), base);
    }
}
