// Adapters layer: concrete implementations of the domain ports.

pub mod html;
pub mod jupyter;

pub use html::TemplateExporter;
pub use jupyter::{JupyterEngine, JupyterKernelCatalog, StaticKernelCatalog};
