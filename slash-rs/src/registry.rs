//! Command registry.
//!
//! Commands are registered on a [`RegistryBuilder`], which validates each
//! declaration and flattens the tree into a table of [`CommandNode`]s.
//! [`RegistryBuilder::initialize`] consumes the builder and returns a
//! read-only [`CommandRegistry`] that resolves requests to nodes and exports
//! the wire schema.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use slash_api::{CommandSchema, OptionSchema, OptionType};

use crate::command::{Command, CommandHandler, CommandNode, NodeId};
use crate::error::ConfigError;
use crate::interaction::Interaction;
use crate::permission::Permissions;

/// Deepest allowed node: root (0), group (1), subcommand (2)
const MAX_DEPTH: usize = 2;

/// Registration phase of the registry
pub struct RegistryBuilder<R: Interaction> {
    nodes: Vec<CommandNode<R>>,
    roots: HashMap<String, NodeId>,
    root_order: Vec<NodeId>,
    pending_init: Vec<Arc<dyn CommandHandler<R>>>,
    error: Option<ConfigError>,
}

impl<R: Interaction> Default for RegistryBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Interaction> RegistryBuilder<R> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            roots: HashMap::new(),
            root_order: Vec::new(),
            pending_init: Vec::new(),
            error: None,
        }
    }

    /// Register a root command and its subtree
    pub fn register(&mut self, command: Command<R>) -> Result<NodeId, ConfigError> {
        let result = self.insert(None, command);
        self.record(result)
    }

    /// Register a command below an already registered node
    pub fn register_child(
        &mut self,
        parent: NodeId,
        command: Command<R>,
    ) -> Result<NodeId, ConfigError> {
        let result = if parent.0 < self.nodes.len() {
            self.insert(Some(parent), command)
        } else {
            Err(ConfigError::UnknownParent { parent: parent.0 })
        };
        self.record(result)
    }

    /// First registration error, if any
    pub fn error(&self) -> Option<&ConfigError> {
        self.error.as_ref()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Freeze the registry.
    ///
    /// Fails with the first recorded registration error. Otherwise every
    /// registered handler's `init` hook runs once, in registration order.
    pub async fn initialize(self) -> Result<CommandRegistry<R>, ConfigError> {
        if let Some(error) = self.error {
            tracing::error!(error = %error, "Registry initialization refused");
            return Err(error);
        }

        for handler in &self.pending_init {
            handler.init().await;
        }

        tracing::info!(
            roots = self.root_order.len(),
            commands = self.nodes.len(),
            "Command registry initialized"
        );

        Ok(CommandRegistry {
            nodes: self.nodes,
            roots: self.roots,
            root_order: self.root_order,
        })
    }

    fn record(&mut self, result: Result<NodeId, ConfigError>) -> Result<NodeId, ConfigError> {
        if let Err(error) = &result {
            tracing::warn!(error = %error, "Command registration failed");
            if self.error.is_none() {
                self.error = Some(error.clone());
            }
        }
        result
    }

    fn path(&self, id: NodeId) -> String {
        path_parts(&self.nodes, id).join(" ")
    }

    fn insert(
        &mut self,
        parent: Option<NodeId>,
        mut command: Command<R>,
    ) -> Result<NodeId, ConfigError> {
        let path = match parent {
            Some(parent) => format!("{} {}", self.path(parent), command.name),
            None => command.name.clone(),
        };

        let depth = parent.map_or(0, |parent| self.nodes[parent.0].depth + 1);
        if depth > MAX_DEPTH {
            return Err(ConfigError::TooDeep { command: path });
        }

        let taken = match parent {
            Some(parent) => {
                let node = &self.nodes[parent.0];
                node.children.contains_key(&command.name)
                    || node.arguments.iter().any(|arg| arg.name() == command.name)
            }
            None => self.roots.contains_key(&command.name),
        };
        if taken {
            return Err(ConfigError::DuplicateCommand { path });
        }

        validate_arguments(&command, &path)?;

        let handler = command.take_handler();
        let children = std::mem::take(&mut command.children);
        let id = NodeId(self.nodes.len());

        if let Some(handler) = &handler {
            self.pending_init.push(handler.clone());
        }

        self.nodes.push(CommandNode {
            name: command.name.clone(),
            description: command.description,
            enabled: command.enabled,
            permissions: command.permissions,
            arguments: command.arguments,
            children: HashMap::new(),
            order: Vec::new(),
            parent,
            handler,
            hooks: command.hooks,
            depth,
        });

        match parent {
            Some(parent) => {
                let node = &mut self.nodes[parent.0];
                node.children.insert(command.name, id);
                node.order.push(id);
            }
            None => {
                self.roots.insert(command.name, id);
                self.root_order.push(id);
            }
        }

        tracing::info!(command = %path, "Command registered");

        for child in children {
            self.insert(Some(id), child)?;
        }

        Ok(id)
    }
}

fn validate_arguments<R: Interaction>(command: &Command<R>, path: &str) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    let mut seen_optional = false;

    for argument in &command.arguments {
        if !names.insert(argument.name())
            || command.children.iter().any(|child| child.name == argument.name())
        {
            return Err(ConfigError::DuplicateArgument {
                argument: argument.name().to_string(),
                command: path.to_string(),
            });
        }

        if argument.is_required() && seen_optional {
            return Err(ConfigError::RequiredAfterOptional {
                argument: argument.name().to_string(),
                command: path.to_string(),
            });
        }

        seen_optional |= !argument.is_required();
    }

    Ok(())
}

fn path_parts<R: Interaction>(nodes: &[CommandNode<R>], id: NodeId) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut current = Some(id);

    while let Some(node) = current.and_then(|id| nodes.get(id.0)) {
        parts.push(node.name.as_str());
        current = node.parent;
    }

    parts.reverse();
    parts
}

/// Frozen command table
pub struct CommandRegistry<R: Interaction> {
    nodes: Vec<CommandNode<R>>,
    roots: HashMap<String, NodeId>,
    root_order: Vec<NodeId>,
}

impl<R: Interaction> CommandRegistry<R> {
    /// Find the node addressed by a root name, optional group and optional
    /// subcommand. Any failed lookup is no match.
    pub fn resolve(
        &self,
        root: &str,
        group: Option<&str>,
        subcommand: Option<&str>,
    ) -> Option<NodeId> {
        let mut current = *self.roots.get(root)?;

        if let Some(group) = group {
            current = self.nodes[current.0].child(group)?;
        }

        if let Some(subcommand) = subcommand {
            current = self.nodes[current.0].child(subcommand)?;
        }

        Some(current)
    }

    pub fn resolve_interaction(&self, source: &R) -> Option<NodeId> {
        self.resolve(
            source.command_name(),
            source.subcommand_group(),
            source.subcommand(),
        )
    }

    /// Whether `source` points at `id`
    pub fn matches(&self, id: NodeId, source: &R) -> bool {
        self.resolve_interaction(source) == Some(id)
    }

    /// Node by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by another registry; use [`get`](Self::get)
    /// for ids of unknown origin.
    pub fn node(&self, id: NodeId) -> &CommandNode<R> {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&CommandNode<R>> {
        self.nodes.get(id.0)
    }

    pub fn root(&self, name: &str) -> Option<NodeId> {
        self.roots.get(name).copied()
    }

    /// Root ids in registration order
    pub fn roots(&self) -> &[NodeId] {
        &self.root_order
    }

    /// Every node, in registration order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &CommandNode<R>)> {
        self.nodes.iter().enumerate().map(|(index, node)| (NodeId(index), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn path_parts(&self, id: NodeId) -> Vec<&str> {
        path_parts(&self.nodes, id)
    }

    /// Space-joined path from the root, e.g. `mod ban user`
    pub fn path(&self, id: NodeId) -> String {
        self.path_parts(id).join(" ")
    }

    /// Bits required to run `id`: its own and every ancestor's
    pub fn required_permissions(&self, id: NodeId) -> Permissions {
        let mut required = Permissions::empty();
        let mut current = Some(id);

        while let Some(node) = current.and_then(|id| self.get(id)) {
            required |= node.permissions;
            current = node.parent;
        }

        required
    }

    /// Option descriptor for a non-root node
    pub fn option_schema(&self, id: NodeId) -> OptionSchema {
        let node = &self.nodes[id.0];
        let kind = if node.order.is_empty() {
            OptionType::Subcommand
        } else {
            OptionType::SubcommandGroup
        };

        let mut schema = OptionSchema::command(kind, &node.name, &node.description);
        schema.options = self.options(node);
        schema
    }

    /// Root descriptors for every enabled root, ready to publish
    pub fn command_schemas(&self) -> Vec<CommandSchema> {
        self.root_order
            .iter()
            .map(|id| &self.nodes[id.0])
            .filter(|node| node.enabled)
            .map(|node| {
                let mut schema = CommandSchema::new(&node.name, &node.description)
                    .default_member_permissions(node.permissions.bits());
                schema.options = self.options(node);
                schema
            })
            .collect()
    }

    fn options(&self, node: &CommandNode<R>) -> Vec<OptionSchema> {
        let mut options: Vec<OptionSchema> = node
            .order
            .iter()
            .filter(|child| self.nodes[child.0].enabled)
            .map(|child| self.option_schema(*child))
            .collect();

        if node.enabled && !node.is_container() {
            options.extend(node.arguments.iter().map(|argument| argument.schema()));
        }

        options
    }
}

impl<R: Interaction> std::fmt::Debug for CommandRegistry<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("roots", &self.root_order.len())
            .field("nodes", &self.nodes)
            .finish()
    }
}
