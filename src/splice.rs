//! Marker splicing for template source files.
//!
//! Input is passed through line by line. The line containing
//! [`GENERATION_MARKER`] is replaced by a fenced block holding one expansion
//! per catalog operation and template of the selected front-end. Output is
//! assembled in memory so a failed expansion leaves nothing half-written.

use crate::catalog::{CatalogIndex, Category, OperationName};
use crate::error::GenError;
use crate::signatures::SubstitutionTable;
use crate::template::{
    CBK_DECL_TEMPLATE, Expander, FD_CBK_TEMPLATE, FD_FOP_TEMPLATE, FOP_DECL_TEMPLATE,
    INODE_CBK_TEMPLATE, INODE_FOP_TEMPLATE, RoutingLayout, Template,
};
use anyhow::bail;
use tracing::{debug, info, warn};

pub const GENERATION_MARKER: &str = "#pragma generate";
pub const BEGIN_FENCE: &str = "/* BEGIN GENERATED CODE - DO NOT MODIFY */";
pub const END_FENCE: &str = "/* END GENERATED CODE */";

/// Which file the generated block lands in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frontend {
    /// Declarations for every category, `unsupported` included.
    Header,
    /// Callback and forward-call bodies for behavioral categories.
    Implementation,
}

impl Frontend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frontend::Header => "header",
            Frontend::Implementation => "impl",
        }
    }

    /// Templates emitted for one category, or `None` when the category is
    /// skipped by this front-end.
    pub fn emission(&self, category: Category) -> Option<Emission> {
        let layout = match category {
            Category::FdDs => RoutingLayout::Data,
            Category::Inode | Category::FdMds | Category::Unsupported => RoutingLayout::Metadata,
        };
        let (callback, forward) = match (self, category) {
            (Frontend::Header, Category::Unsupported) => (None, FOP_DECL_TEMPLATE),
            (Frontend::Header, _) => (Some(CBK_DECL_TEMPLATE), FOP_DECL_TEMPLATE),
            (Frontend::Implementation, Category::Unsupported) => return None,
            (Frontend::Implementation, Category::Inode) => {
                (Some(INODE_CBK_TEMPLATE), INODE_FOP_TEMPLATE)
            }
            (Frontend::Implementation, Category::FdMds | Category::FdDs) => {
                (Some(FD_CBK_TEMPLATE), FD_FOP_TEMPLATE)
            }
        };
        Some(Emission {
            callback,
            forward,
            layout,
        })
    }
}

impl TryFrom<&str> for Frontend {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        match value {
            "header" => Ok(Frontend::Header),
            "impl" => Ok(Frontend::Implementation),
            other => bail!("Unknown frontend: {other}"),
        }
    }
}

/// Template pair (or lone declaration) generated per operation of a category.
#[derive(Clone, Copy, Debug)]
pub struct Emission {
    pub callback: Option<Template>,
    pub forward: Template,
    pub layout: RoutingLayout,
}

pub struct Splicer<'a> {
    catalog: &'a CatalogIndex,
    expander: Expander<'a>,
    frontend: Frontend,
}

impl<'a> Splicer<'a> {
    pub fn new(
        catalog: &'a CatalogIndex,
        table: &'a dyn SubstitutionTable,
        frontend: Frontend,
    ) -> Self {
        Self {
            catalog,
            expander: Expander::new(table, catalog.error_policy()),
            frontend,
        }
    }

    /// The fenced block that replaces the marker line, newline-terminated.
    pub fn generated_block(&self) -> Result<String, GenError> {
        let mut block = String::new();
        block.push_str(BEGIN_FENCE);
        block.push('\n');

        let mut expansions = 0usize;
        for category in Category::ALL {
            let Some(emission) = self.frontend.emission(category) else {
                continue;
            };
            for operation in self.catalog.operations(category) {
                expansions += self.emit_operation(&mut block, &emission, operation)?;
                debug!(
                    frontend = self.frontend.as_str(),
                    category = category.as_str(),
                    operation = operation.as_str(),
                    "expanded fop"
                );
            }
        }

        block.push_str(END_FENCE);
        block.push('\n');
        info!(
            frontend = self.frontend.as_str(),
            catalog = %self.catalog.key(),
            expansions,
            "generated fop block"
        );
        Ok(block)
    }

    fn emit_operation(
        &self,
        block: &mut String,
        emission: &Emission,
        operation: &OperationName,
    ) -> Result<usize, GenError> {
        let mut count = 0;
        for template in emission.callback.iter().chain(Some(&emission.forward)) {
            let text = self
                .expander
                .expand(template, operation, Some(emission.layout))?;
            block.push_str(&text);
            block.push('\n');
            count += 1;
        }
        Ok(count)
    }

    /// Copy `input` through, replacing the marker line with the generated
    /// block. Only the `\n` terminator is stripped and re-added, so `\r\n`
    /// lines keep their `\r`. A final line without a terminator gains one.
    pub fn splice(&self, input: &str) -> Result<String, GenError> {
        let mut out = String::with_capacity(input.len());
        let mut marker_line: Option<usize> = None;

        for (idx, chunk) in input.split_inclusive('\n').enumerate() {
            let lineno = idx + 1;
            let line = chunk.strip_suffix('\n').unwrap_or(chunk);
            if line.contains(GENERATION_MARKER) {
                if let Some(first) = marker_line {
                    return Err(GenError::DuplicateMarker {
                        first,
                        line: lineno,
                    });
                }
                marker_line = Some(lineno);
                out.push_str(&self.generated_block()?);
            } else {
                out.push_str(line);
                out.push('\n');
            }
        }

        if marker_line.is_none() {
            warn!("input has no '{GENERATION_MARKER}' line; passing it through unchanged");
        }
        Ok(out)
    }
}
