//! Built-in prototypes, registered in [`Registry::builtin`](super::Registry::builtin).
//!
//! | Name | Kind | Offset | Options |
//! |------|------|--------|---------|
//! | `trim` | filter | 0 | `chars` |
//! | `collapse_whitespace` | filter | 5 | |
//! | `lowercase` | filter | 10 | |
//! | `uppercase` | filter | 10 | |
//! | `required` | constraint | 0 | `message` |
//! | `length` | constraint | 10 | `min`, `max`, `mode` |
//! | `range` | constraint | 10 | `min`, `max` |
//! | `pattern` | constraint | 20 | `pattern` (required) |
//! | `choice` | constraint | 20 | `choices` (required) |
//! | `unique` | constraint | 30 | |

mod constraints;
mod filters;

pub use constraints::{Choice, Length, Pattern, Range, Required, Unique};
pub use filters::{CollapseWhitespace, Lowercase, Trim, Uppercase};

use super::prototype::Prototype;
use super::registry::Factory;

fn boxed<T: Prototype + Default + 'static>() -> Box<dyn Prototype> {
    Box::new(T::default())
}

pub(crate) const FACTORIES: &[Factory] = &[
    boxed::<Trim>,
    boxed::<CollapseWhitespace>,
    boxed::<Lowercase>,
    boxed::<Uppercase>,
    boxed::<Required>,
    boxed::<Length>,
    boxed::<Range>,
    boxed::<Pattern>,
    boxed::<Choice>,
    boxed::<Unique>,
];
