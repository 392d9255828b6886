//! Pipeline stages for deck evaluation.
//!
//! Each submodule implements exactly one step.
//!
//! ```text
//! input ──▶ extract ──▶ gate ──▶ llm ──▶ normalize
//! (path/URL) (pdf/pptx)  (≥50 chars) (fallback) (JSON → report)
//! ```
//!
//! 1. [`input`]     — read a local file or download a URL into memory
//! 2. [`extract`]   — flatten the deck to text; PDF work runs in `spawn_blocking`
//! 3. [`gate`]      — reject decks with too little text before any model call
//! 4. [`llm`]       — try candidate models in order; the only stage talking
//!    to a model
//! 5. [`normalize`] — fence stripping, JSON parsing, schema repair

pub mod extract;
pub mod gate;
pub mod input;
pub mod llm;
pub mod normalize;
