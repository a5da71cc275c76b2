//! Output generation: the CSV tables and the notice summary.
//!
//! # Submodules
//!
//! - [`table`]: reads and writes the harvest and analysis tables
//! - [`summary`]: groups notices by campus and topic for the final report
//!
//! # Output Structure
//!
//! ```text
//! data/
//! ├── noticias_ifpi.csv    # titulo, link, data, texto
//! └── analise_editais.csv  # titulo, link, data, Is_Edital, Campus_Citado, Topico_Classificado
//! ```

pub mod summary;
pub mod table;
