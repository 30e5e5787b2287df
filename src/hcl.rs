#![forbid(unsafe_code)]

//! Terraform configuration model: parsing, positions, values and evaluation

pub mod annotation;
pub mod eval;
pub mod expr;
pub mod module;
pub mod position;
pub mod value;

pub use annotation::{Annotation, parse_annotations};
pub use eval::Evaluator;
pub use expr::{Attribute, Expr};
pub use module::{
    Declaration, Local, Module, ModuleCall, Resource, SourceFile, Variable, display_path,
    has_json_extension, is_config_file,
};
pub use position::LineIndex;
pub use value::{Shape, Value};
