//! Multi-step conversational forms
//!
//! A form is an ordered list of steps (input, message, wait, function) run one
//! at a time. After each step the run loop waits for exactly one control
//! signal (advance, repeat, skip, stop) raised by the step or its callback.
//!
//! # Example
//!
//! ```ignore
//! use chat_wait::form::{accept_any, validator};
//! use chat_wait::ContentKind;
//!
//! let mut form = bridge
//!     .form()
//!     .add_message("What's your name?")
//!     .add_input(ContentKind::Text, "name", accept_any())
//!     .add_message("Thanks!");
//!
//! form.run(&ctx).await?;
//! println!("Hello {}", form.answer("name").text);
//! ```

mod control;
mod executor;
mod runner;
mod state;

pub use control::{FormHandle, Signal};
pub use executor::{Step, StepFunction, Validator, accept_any, step_fn, validator};
pub use runner::Form;
pub use state::{Answers, FormState};
