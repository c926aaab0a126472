// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Recording, submitting and waiting on the single command stream.

* [`state`] - the explicit access/layout model every command is checked against
* [`sequencer`] - the `Idle → Recording → Ended → Submitted → Completed` state machine
* [`fence`] - completion signaling and wait policies
*/

pub mod fence;
pub mod sequencer;
pub mod state;

pub use fence::{Fence, WaitPolicy};
pub use sequencer::{CommandSequencer, RecordedCommand, SequencerState};
pub use state::{Access, ImageLayout, LayoutTransition, ResourceState, ResourceTracker};
