//! Form and table rendering engines for the Januscope dashboard.
//!
//! Schemas come from `januscope-domain`; this crate owns the interactive
//! state behind them and the ports the engines call out through.

#![forbid(unsafe_code)]

/// Form session state, validation and the async controller.
pub mod form_engine;
mod form_ports;
/// Field renderers and the registry that selects them.
pub mod renderer_registry;
/// Table session state, row pipeline, selection and export.
pub mod table_engine;
mod table_ports;
mod value_text;

pub use form_engine::{
    FormController, FormOptions, FormSession, FormSessionInput, SubmitAttempt, SubmitOutcome,
};
pub use form_ports::FormSubmitHandler;
pub use renderer_registry::{FieldRenderContext, FieldRenderer, RendererRegistry};
pub use table_engine::{ExportOutcome, TableOptions, TableSession, TableView};
pub use table_ports::{ExportFile, SpreadsheetExportGateway};
