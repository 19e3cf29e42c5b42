//! Session state machine tying the description and banner stages together.
//!
//! ```text
//! Initial --submit--> Loading --description--> DescriptionReady --> Loading --banner--> ImageReady
//!                        |                                             |
//!                        +----------------> Failed <-------------------+
//! any state --reset--> Initial
//! ```

mod cell;
mod controller;
mod state;

pub use cell::{StateCell, Ticket};
pub use controller::{SessionController, Stage};
pub use state::SessionState;
