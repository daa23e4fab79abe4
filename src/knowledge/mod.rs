#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
//! Set-count constraint propagation.
//!
//! Layered bottom-up: [`constraint`] values, the [`knowledge_base`] that
//! simplifies and resolves them to a fixed point, and the [`agent`] that feeds
//! observations in and picks moves through a pluggable [`chooser`].

pub mod agent;
pub mod chooser;
pub mod constraint;
pub mod error;
pub mod knowledge_base;
pub mod variable;

pub use agent::{Agent, MoveKind};
pub use chooser::{Chooser, ChooserImpls, ChooserType, FirstChooser, RandomChooser};
pub use constraint::Constraint;
pub use error::{Contradiction, KnowledgeError};
pub use knowledge_base::{Deductions, KnowledgeBase, PropagationStats};
pub use variable::Variable;
