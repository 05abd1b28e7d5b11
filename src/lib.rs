//! `richdoc` - formatted text document engine
//!
//! An editable multi-line document of formatted runs with caret and
//! selection handling, incremental layout and word wrap, URL detection,
//! grouped undo/redo and RTF import/export. Measurement and painting go
//! through the [`TextMeasurer`] and [`Painter`] traits so the engine has no
//! windowing dependency.

// Crate-level lint configuration
#![allow(clippy::cast_possible_truncation)] // Pixel and twip conversions
#![allow(clippy::cast_sign_loss)] // Pixel and twip conversions
#![allow(clippy::cast_precision_loss)] // Offsets to layout coordinates
#![allow(clippy::cast_possible_wrap)] // RTF parameters are i32
#![allow(clippy::module_name_repetitions)] // Allow DocumentOptions etc
#![allow(clippy::struct_excessive_bools)] // Options need multiple flags
#![allow(clippy::missing_errors_doc)] // Docs WIP
#![allow(clippy::missing_panics_doc)] // Docs WIP
#![allow(clippy::missing_const_for_fn)] // Many functions could be const, not critical
#![allow(clippy::doc_markdown)] // Allow technical names without backticks
#![allow(clippy::use_self)] // Allow explicit type names in impl blocks
#![allow(clippy::needless_pass_by_value)] // Allow pass by value for small Copy types
#![allow(clippy::suboptimal_flops)] // Standard math notation is clearer than mul_add
#![allow(clippy::float_cmp)] // Formats compare stored values, not computed ones
#![allow(clippy::collapsible_if)] // Sometimes nested ifs are clearer
#![allow(clippy::cast_lossless)] // as casts are fine for primitive widening
#![allow(clippy::items_after_statements)] // Common pattern in tests
#![allow(clippy::semicolon_if_nothing_returned)] // Style preference

pub mod color;
pub mod document;
pub mod error;
pub mod event;
pub mod measure;
pub mod options;
pub mod picture;
pub mod rtf;
pub mod style;
pub mod undo;

// Re-export core types at crate root
pub use color::Color;
pub use document::{
    CaretDirection, CharLocation, DocPosition, Document, DocumentFragment, FindOptions,
    FragmentLine, HorizontalAlignment, Line, LineEnding, LineId, LineTag, Marker, Painter,
    ParagraphFormat, Rect, SelectionMode, TabKind, TabStop, TabStopCollection,
};
pub use error::{Error, Result};
pub use event::{DocumentEvents, SubscriptionId};
pub use measure::{FontMetrics, MonospaceMeasurer, TextMeasurer};
pub use options::DocumentOptions;
pub use picture::{Picture, PictureDecoder, PictureKind, RawPictureDecoder};
pub use rtf::{RtfError, RtfErrorKind};
pub use style::{Font, FontStyle, FormatSpecified, TagFormat, TextFormat, TextPosition};
pub use undo::UndoManager;
