#![forbid(unsafe_code)]

//! Terraform module loading
//!
//! A [`Module`] is the parsed contents of one directory: every `*.tf` and
//! `*.tf.json` file, plus input values from `terraform.tfvars` and
//! `*.auto.tfvars` when the module is the root module.
//!
//! Native syntax is parsed with `hcl-edit`, which keeps byte spans for every
//! block, attribute and expression. JSON syntax carries no spans, so every
//! declaration found in a `.tf.json` file points at the start of that file.

use crate::error::LoadError;
use crate::hcl::annotation::{Annotation, parse_annotations};
use crate::hcl::expr::{Attribute, Expr};
use crate::hcl::position::LineIndex;
use crate::types::SourceRange;
use hcl_edit::Span;
use hcl_edit::expr::Expression;
use hcl_edit::structure::{Block, BlockLabel, Body};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Arguments of a `module` block that are not passed as input variables
const MODULE_META_ARGUMENTS: &[&str] = &[
    "source",
    "version",
    "count",
    "for_each",
    "providers",
    "depends_on",
];

/// A configuration source file belonging to a module
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path as displayed in diagnostics, e.g. `main.tf` or `modules/app/main.tf`
    pub name: String,
    pub content: String,
    /// Ignore annotations found in comments, empty for JSON files
    pub annotations: Vec<Annotation>,
}

impl SourceFile {
    /// Whether the file uses JSON syntax
    pub fn is_json(&self) -> bool {
        has_json_extension(&self.name)
    }
}

/// A `resource "type" "name"` block
#[derive(Debug, Clone)]
pub struct Resource {
    pub resource_type: String,
    pub name: String,
    /// Range of the block header, from the keyword to the last label
    pub def_range: SourceRange,
    /// Range of the whole block including its body
    pub range: SourceRange,
    pub attributes: Vec<Attribute>,
    /// Types of nested blocks, in declaration order
    pub nested_blocks: Vec<String>,
}

impl Resource {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }
}

/// A named declaration with the range that introduces it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub decl_range: SourceRange,
}

/// A single entry of a `locals` block
#[derive(Debug, Clone)]
pub struct Local {
    pub name: String,
    pub expr: Expr,
    pub decl_range: SourceRange,
}

/// A `variable` block
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub default: Option<Expr>,
    pub decl_range: SourceRange,
}

/// A `module` block
#[derive(Debug, Clone)]
pub struct ModuleCall {
    pub name: String,
    /// Literal `source` argument, if present and static
    pub source: Option<String>,
    /// Input variable assignments (meta-arguments excluded)
    pub arguments: Vec<Attribute>,
    pub decl_range: SourceRange,
}

impl ModuleCall {
    /// Whether `source` is a relative filesystem path
    pub fn is_local(&self) -> bool {
        self.source
            .as_deref()
            .is_some_and(|source| source.starts_with("./") || source.starts_with("../"))
    }
}

/// Parsed contents of one Terraform module directory
#[derive(Debug, Clone)]
pub struct Module {
    dir: PathBuf,
    is_root: bool,
    files: Vec<SourceFile>,
    resources: Vec<Resource>,
    outputs: Vec<Declaration>,
    locals: Vec<Local>,
    variables: Vec<Variable>,
    module_calls: Vec<ModuleCall>,
    input_values: BTreeMap<String, Expr>,
}

impl Module {
    fn empty(dir: PathBuf) -> Self {
        Self {
            dir,
            is_root: true,
            files: Vec::new(),
            resources: Vec::new(),
            outputs: Vec::new(),
            locals: Vec::new(),
            variables: Vec::new(),
            module_calls: Vec::new(),
            input_values: BTreeMap::new(),
        }
    }

    /// Load the root module from a directory
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, LoadError> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| LoadError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str())
                && (is_config_file(name) || is_tfvars_file(name))
            {
                names.push(name.to_string());
            }
        }

        let mut sources = Vec::with_capacity(names.len());
        for name in names {
            let path = dir.join(&name);
            let content = fs::read_to_string(&path)
                .map_err(|source| LoadError::Io { path, source })?;
            sources.push((name, content));
        }

        Self::build(dir.to_path_buf(), sources)
    }

    /// Build the root module from in-memory sources
    ///
    /// `files` pairs a file name (relative to `dir`) with its content.
    pub fn from_sources(dir: impl AsRef<Path>, files: &[(&str, &str)]) -> Result<Self, LoadError> {
        let sources = files
            .iter()
            .map(|(name, content)| (name.to_string(), content.to_string()))
            .collect();
        Self::build(dir.as_ref().to_path_buf(), sources)
    }

    /// Mark this module as a child module
    ///
    /// Child modules never read tfvars files; their inputs come from the
    /// calling module.
    pub fn into_child(mut self) -> Self {
        self.is_root = false;
        self.input_values.clear();
        self
    }

    fn build(dir: PathBuf, mut sources: Vec<(String, String)>) -> Result<Self, LoadError> {
        sources.sort_by(|a, b| {
            tfvars_precedence(&a.0)
                .cmp(&tfvars_precedence(&b.0))
                .then_with(|| a.0.cmp(&b.0))
        });

        let mut module = Module::empty(dir);
        for (name, content) in sources {
            let display = module.display_name(&name);
            if is_tfvars_file(&name) {
                module.load_tfvars(&display, &content)?;
            } else if is_config_file(&name) {
                let annotations = if has_json_extension(&name) {
                    module.load_json_file(&display, &content)?;
                    Vec::new()
                } else {
                    module.load_hcl_file(&display, &content)?
                };
                module.files.push(SourceFile {
                    name: display,
                    content,
                    annotations,
                });
            }
        }

        tracing::debug!(
            dir = %module.dir.display(),
            files = module.files.len(),
            resources = module.resources.len(),
            "loaded module"
        );
        Ok(module)
    }

    /// Path shown in diagnostics for a file of this module
    fn display_name(&self, file_name: &str) -> String {
        display_path(&self.dir, file_name)
    }

    fn load_hcl_file(&mut self, name: &str, content: &str) -> Result<Vec<Annotation>, LoadError> {
        let body = parse_hcl(name, content)?;
        let index = LineIndex::new(name, content);

        for block in body.blocks() {
            let labels = block_labels(block);
            match (block.ident.as_str(), labels.as_slice()) {
                ("resource", [resource_type, resource_name]) => {
                    self.resources.push(Resource {
                        resource_type: resource_type.clone(),
                        name: resource_name.clone(),
                        def_range: def_range(block, &index),
                        range: index.optional_range(block.span()),
                        attributes: block
                            .body
                            .attributes()
                            .map(|attr| hcl_attribute(attr, &index))
                            .collect(),
                        nested_blocks: block
                            .body
                            .blocks()
                            .map(|nested| nested.ident.as_str().to_string())
                            .collect(),
                    });
                }
                ("output", [output_name]) => {
                    self.outputs.push(Declaration {
                        name: output_name.clone(),
                        decl_range: def_range(block, &index),
                    });
                }
                ("locals", []) => {
                    for attr in block.body.attributes() {
                        let attribute = hcl_attribute(attr, &index);
                        self.locals.push(Local {
                            name: attribute.name,
                            expr: attribute.expr,
                            decl_range: attribute.range,
                        });
                    }
                }
                ("variable", [variable_name]) => {
                    self.variables.push(Variable {
                        name: variable_name.clone(),
                        default: block
                            .body
                            .get_attribute("default")
                            .map(|attr| hcl_attribute(attr, &index).expr),
                        decl_range: def_range(block, &index),
                    });
                }
                ("module", [call_name]) => {
                    let source = block.body.get_attribute("source").and_then(|attr| {
                        match &attr.value {
                            Expression::String(s) => Some(s.value().to_string()),
                            _ => None,
                        }
                    });
                    self.module_calls.push(ModuleCall {
                        name: call_name.clone(),
                        source,
                        arguments: block
                            .body
                            .attributes()
                            .filter(|attr| !MODULE_META_ARGUMENTS.contains(&attr.key.as_str()))
                            .map(|attr| hcl_attribute(attr, &index))
                            .collect(),
                        decl_range: def_range(block, &index),
                    });
                }
                _ => {}
            }
        }

        Ok(parse_annotations(name, content, &body))
    }

    fn load_json_file(&mut self, name: &str, content: &str) -> Result<(), LoadError> {
        let root: serde_json::Value =
            serde_json::from_str(content).map_err(|e| LoadError::Parse {
                file: name.to_string(),
                message: e.to_string(),
            })?;
        let range = SourceRange::file_start(name);
        let json_attribute = |attr_name: &str, value: &serde_json::Value| Attribute {
            name: attr_name.to_string(),
            expr: Expr::from_json(value.clone(), range.clone()),
            range: range.clone(),
        };

        for (resource_type, instances) in json_object(&root, "resource") {
            for (resource_name, body) in json_entries(instances) {
                self.resources.push(Resource {
                    resource_type: resource_type.clone(),
                    name: resource_name.clone(),
                    def_range: range.clone(),
                    range: range.clone(),
                    attributes: json_entries(body)
                        .map(|(k, v)| json_attribute(k, v))
                        .collect(),
                    nested_blocks: Vec::new(),
                });
            }
        }

        for (output_name, _) in json_object(&root, "output") {
            self.outputs.push(Declaration {
                name: output_name.clone(),
                decl_range: range.clone(),
            });
        }

        for (local_name, value) in json_object(&root, "locals") {
            self.locals.push(Local {
                name: local_name.clone(),
                expr: Expr::from_json(value.clone(), range.clone()),
                decl_range: range.clone(),
            });
        }

        for (variable_name, body) in json_object(&root, "variable") {
            self.variables.push(Variable {
                name: variable_name.clone(),
                default: body
                    .get("default")
                    .map(|value| Expr::from_json(value.clone(), range.clone())),
                decl_range: range.clone(),
            });
        }

        for (call_name, body) in json_object(&root, "module") {
            self.module_calls.push(ModuleCall {
                name: call_name.clone(),
                source: body
                    .get("source")
                    .and_then(|s| s.as_str())
                    .map(str::to_string),
                arguments: json_entries(body)
                    .filter(|(k, _)| !MODULE_META_ARGUMENTS.contains(&k.as_str()))
                    .map(|(k, v)| json_attribute(k, v))
                    .collect(),
                decl_range: range.clone(),
            });
        }

        Ok(())
    }

    fn load_tfvars(&mut self, name: &str, content: &str) -> Result<(), LoadError> {
        if has_json_extension(name) {
            let root: serde_json::Value =
                serde_json::from_str(content).map_err(|e| LoadError::Parse {
                    file: name.to_string(),
                    message: e.to_string(),
                })?;
            for (var_name, value) in json_entries(&root) {
                self.input_values.insert(
                    var_name.clone(),
                    Expr::from_json(value.clone(), SourceRange::file_start(name)),
                );
            }
            return Ok(());
        }

        let body = parse_hcl(name, content)?;
        let index = LineIndex::new(name, content);
        for attr in body.attributes() {
            let attribute = hcl_attribute(attr, &index);
            self.input_values.insert(attribute.name, attribute.expr);
        }
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// Configuration files in name order (tfvars files excluded)
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Resources in file order, then declaration order
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn outputs(&self) -> &[Declaration] {
        &self.outputs
    }

    pub fn locals(&self) -> &[Local] {
        &self.locals
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn module_calls(&self) -> &[ModuleCall] {
        &self.module_calls
    }

    /// Values assigned in tfvars files, later files taking precedence
    pub fn input_values(&self) -> &BTreeMap<String, Expr> {
        &self.input_values
    }

    pub fn local(&self, name: &str) -> Option<&Local> {
        self.locals.iter().find(|local| local.name == name)
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|variable| variable.name == name)
    }
}

fn parse_hcl(name: &str, content: &str) -> Result<Body, LoadError> {
    hcl_edit::parser::parse_body(content).map_err(|e| LoadError::Parse {
        file: name.to_string(),
        message: e.to_string(),
    })
}

fn block_labels(block: &Block) -> Vec<String> {
    block
        .labels
        .iter()
        .map(|label| match label {
            BlockLabel::String(s) => s.value().to_string(),
            BlockLabel::Ident(ident) => ident.as_str().to_string(),
        })
        .collect()
}

/// Range of a block header: the keyword through the last label
fn def_range(block: &Block, index: &LineIndex) -> SourceRange {
    let Some(ident_span) = block.ident.span() else {
        return index.optional_range(block.span());
    };
    let end = block
        .labels
        .last()
        .and_then(|label| match label {
            BlockLabel::String(s) => s.span(),
            BlockLabel::Ident(ident) => ident.span(),
        })
        .map(|span| span.end)
        .unwrap_or(ident_span.end);

    index.range(&(ident_span.start..end))
}

fn hcl_attribute(attr: &hcl_edit::structure::Attribute, index: &LineIndex) -> Attribute {
    Attribute {
        name: attr.key.as_str().to_string(),
        expr: Expr::from_hcl(attr.value.clone(), index.optional_range(attr.value.span())),
        range: index.optional_range(attr.span()),
    }
}

/// Entries of `root[key]` when it is a JSON object
fn json_object<'a>(
    root: &'a serde_json::Value,
    key: &str,
) -> impl Iterator<Item = (&'a String, &'a serde_json::Value)> {
    root.get(key).into_iter().flat_map(json_entries)
}

fn json_entries(
    value: &serde_json::Value,
) -> impl Iterator<Item = (&String, &serde_json::Value)> {
    value.as_object().into_iter().flat_map(|object| object.iter())
}

/// Path of `file_name` inside `dir` as shown in diagnostics
///
/// Uses `/` separators and drops a leading `./`, so files of a module in the
/// working directory are shown by their bare name.
pub fn display_path(dir: &Path, file_name: &str) -> String {
    let dir = dir.to_string_lossy().replace('\\', "/");
    let dir = dir.trim_start_matches("./").trim_end_matches('/');
    if dir.is_empty() || dir == "." {
        file_name.to_string()
    } else {
        format!("{}/{}", dir, file_name)
    }
}

/// Whether a path has the `.json` extension
pub fn has_json_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext == "json")
}

/// Whether a file name is a Terraform configuration file
pub fn is_config_file(name: &str) -> bool {
    name.ends_with(".tf") || name.ends_with(".tf.json")
}

fn is_tfvars_file(name: &str) -> bool {
    matches!(name, "terraform.tfvars" | "terraform.tfvars.json")
        || name.ends_with(".auto.tfvars")
        || name.ends_with(".auto.tfvars.json")
}

/// Load order of tfvars files: `terraform.tfvars` before `*.auto.tfvars`
fn tfvars_precedence(name: &str) -> u8 {
    match name {
        "terraform.tfvars" | "terraform.tfvars.json" => 0,
        _ if is_tfvars_file(name) => 1,
        _ => 0,
    }
}
