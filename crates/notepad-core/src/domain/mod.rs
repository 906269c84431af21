//! Domain entities - the core business objects.

mod chord;
mod diagram;
mod fingering;
mod user;

pub use chord::{Chord, ChordChanges, NewChord};
pub use diagram::{Barre, ChordDiagram, Dot, MIN_VISIBLE_FRETS};
pub use fingering::{Fingering, FingeringError, MAX_FRET, STRING_COUNT, StringPosition};
pub use user::{Role, User};
