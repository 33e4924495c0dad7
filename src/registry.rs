// Tool registry
//
// The live set of compiled tools, built whole-or-not-at-all from a config
// snapshot and published behind a swappable handle. Readers take an Arc
// snapshot that stays consistent for the lifetime of their call; the reload
// path publishes a brand-new registry, never mutating in place.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::ToolDeclaration;
use crate::schema::{self, SchemaError, ToolInputSchema};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tool '{tool}': {source}")]
    Compile {
        tool: String,
        #[source]
        source: SchemaError,
    },

    #[error("duplicate tool identity '{tool}'")]
    DuplicateTool { tool: String },
}

/// A declaration paired with its compiled input schema.
#[derive(Debug, Clone)]
pub struct CompiledTool {
    pub declaration: ToolDeclaration,
    pub schema: ToolInputSchema,
}

impl CompiledTool {
    pub fn identity(&self) -> String {
        self.declaration.identity()
    }
}

/// An immutable set of compiled tools, in declaration order.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<CompiledTool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Compile every declaration into a fresh registry.
    ///
    /// Fails as a whole on the first bad declaration: a registry is never
    /// partially built.
    pub fn build(declarations: &[ToolDeclaration]) -> Result<Self, RegistryError> {
        let mut tools = Vec::with_capacity(declarations.len());
        let mut index = HashMap::with_capacity(declarations.len());

        for declaration in declarations {
            let identity = declaration.identity();
            let schema = schema::compile(&declaration.input).map_err(|source| {
                RegistryError::Compile {
                    tool: identity.clone(),
                    source,
                }
            })?;

            if index.contains_key(&identity) {
                return Err(RegistryError::DuplicateTool { tool: identity });
            }
            index.insert(identity, tools.len());
            tools.push(Arc::new(CompiledTool {
                declaration: declaration.clone(),
                schema,
            }));
        }

        Ok(Self { tools, index })
    }

    /// Look up a tool by its `namespace/name` identity.
    pub fn get(&self, identity: &str) -> Option<&Arc<CompiledTool>> {
        self.index.get(identity).map(|&i| &self.tools[i])
    }

    /// Tools in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<CompiledTool>> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Shared handle to the current registry.
///
/// Cheap to clone; every transport adapter and the reload watcher hold one.
/// `snapshot` hands out the current Arc without blocking writers for longer
/// than the pointer clone; `swap` replaces it atomically for all future
/// calls while in-flight calls keep the snapshot they started with.
#[derive(Clone)]
pub struct RegistryHandle {
    current: Arc<RwLock<Arc<ToolRegistry>>>,
}

impl RegistryHandle {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(registry))),
        }
    }

    /// The current registry snapshot.
    pub async fn snapshot(&self) -> Arc<ToolRegistry> {
        self.current.read().await.clone()
    }

    /// Publish a new registry, replacing the current one.
    pub async fn swap(&self, registry: ToolRegistry) {
        let mut current = self.current.write().await;
        *current = Arc::new(registry);
    }
}
