//! # Compile Pipeline
//!
//! Parse → compile to module → instantiate, behind one async call.
//!
//! The work runs on tokio's blocking pool so the caller's executor never
//! stalls on a large document. Every failure comes back as a `CompileError`
//! located in the source; a panicking compile is reported as `Runtime`.

use crate::cache::ModuleCache;
use crate::errors::{CompileError, StageError};
use crate::normalizer::SourceText;
use async_trait::async_trait;
use livemark_evaluator::{
    compile_module, instantiate, CompiledModule, ComponentRegistry, DocumentTree, UnknownTagFallback,
};
use livemark_parser::{parse, source_id};
use std::sync::Arc;
use tokio::task::JoinError;
use tracing::{debug, instrument};

/// Anything that turns source text into a document tree.
///
/// The scheduler is generic over this so it can be driven by test doubles.
#[async_trait]
pub trait Compiler: Send + Sync + 'static {
    async fn compile(&self, source: SourceText) -> Result<DocumentTree, CompileError>;
}

/// Production compiler bound to a component registry
#[derive(Clone)]
pub struct Pipeline {
    registry: ComponentRegistry,
    fallback: UnknownTagFallback,
    cache: Option<Arc<ModuleCache>>,
}

impl Pipeline {
    pub fn new(registry: ComponentRegistry) -> Self {
        Self {
            registry,
            fallback: UnknownTagFallback::default(),
            cache: None,
        }
    }

    pub fn with_fallback(mut self, fallback: UnknownTagFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Enable the module cache; a capacity of 0 leaves it off
    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.cache = ModuleCache::new(capacity).map(Arc::new);
        self
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn fallback(&self) -> UnknownTagFallback {
        self.fallback
    }

    pub fn cache(&self) -> Option<&ModuleCache> {
        self.cache.as_deref()
    }
}

#[async_trait]
impl Compiler for Pipeline {
    async fn compile(&self, source: SourceText) -> Result<DocumentTree, CompileError> {
        let pipeline = self.clone();
        let task = tokio::task::spawn_blocking(move || {
            compile_blocking(&source, &pipeline.registry, pipeline.fallback, pipeline.cache.as_deref())
        });

        match task.await {
            Ok(result) => result,
            Err(err) => Err(join_failure(err)),
        }
    }
}

/// Compile `source` against `registry` without blocking the caller
pub async fn compile(source: &str, registry: &ComponentRegistry) -> Result<DocumentTree, CompileError> {
    Pipeline::new(registry.clone()).compile(Arc::from(source)).await
}

/// Synchronous pipeline body. The registry snapshot is taken after parsing,
/// so components registered while a large document parses are still seen.
#[instrument(skip_all, fields(source = %source_id(source), len = source.len()))]
pub fn compile_blocking(
    source: &str,
    registry: &ComponentRegistry,
    fallback: UnknownTagFallback,
    cache: Option<&ModuleCache>,
) -> Result<DocumentTree, CompileError> {
    let module = load_module(source, cache).map_err(|err| err.locate(source))?;
    instantiate_module(source, &module, registry, fallback)
}

/// Second half of the pipeline: snapshot the registry as it is now and
/// instantiate `module`
fn instantiate_module(
    source: &str,
    module: &CompiledModule,
    registry: &ComponentRegistry,
    fallback: UnknownTagFallback,
) -> Result<DocumentTree, CompileError> {
    let snapshot = registry.snapshot();
    let tree = instantiate(module, &snapshot, fallback)
        .map_err(|err| StageError::from(err).locate(source))?;

    debug!(nodes = tree.nodes.len(), "Compiled document");
    Ok(tree)
}

fn load_module(source: &str, cache: Option<&ModuleCache>) -> Result<Arc<CompiledModule>, StageError> {
    if let Some(module) = cache.and_then(|cache| cache.get(source)) {
        return Ok(module);
    }

    let document = parse(source)?;
    let module = Arc::new(compile_module(&document, source)?);

    if let Some(cache) = cache {
        cache.insert(Arc::from(source), module.clone());
    }
    Ok(module)
}

pub(crate) fn join_failure(err: JoinError) -> CompileError {
    if err.is_panic() {
        CompileError::panicked(err.into_panic())
    } else {
        CompileError::cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use livemark_evaluator::{ComponentDescriptor, CustomComponentSpec, RenderError, VNode};

    #[tokio::test]
    async fn test_empty_input_gives_empty_tree() {
        let tree = compile("", &ComponentRegistry::with_builtins()).await.unwrap();
        assert!(tree.is_empty());
    }

    #[tokio::test]
    async fn test_unterminated_component_is_parse_error() {
        let err = compile("<Callout>unterminated", &ComponentRegistry::with_builtins())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Parse);
        assert!(err.message.starts_with("1:"), "message: {}", err.message);
        assert!(err.message.contains("Callout"), "message: {}", err.message);
    }

    #[tokio::test]
    async fn test_malformed_expression_is_syntax_error() {
        let err = compile("Total: {1 +}", &ComponentRegistry::with_builtins())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Syntax);
        assert!(err.message.starts_with("1:"));
    }

    #[tokio::test]
    async fn test_comment_expressions_render_nothing() {
        let registry = ComponentRegistry::with_builtins();
        let tree = compile("{/* note */}\n\nVisible {/* aside */} text", &registry).await.unwrap();
        assert_eq!(tree.nodes.len(), 1);
        let text = tree.nodes[0].text_content();
        assert!(text.starts_with("Visible") && text.ends_with("text"), "text: {}", text);
        assert!(!text.contains("aside"));

        // An open comment swallows the closing brace
        let err = compile("{1 /* never closed}", &registry).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
        assert!(err.message.contains("Unterminated expression"), "message: {}", err.message);
    }

    #[tokio::test]
    async fn test_hostile_input_fails_without_crashing() {
        let registry = ComponentRegistry::with_builtins();

        let err = compile("{\"x\".repeat(1e12)}", &registry).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Runtime);
        assert_eq!(err.message, "1:2: Invalid string length");

        let parens = format!("{{{}1{}}}", "(".repeat(1000), ")".repeat(1000));
        let err = compile(&parens, &registry).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert!(err.message.contains("Nesting is deeper than"), "message: {}", err.message);

        let negations = format!("{{{}1}}", "!".repeat(3000));
        assert_eq!(compile(&negations, &registry).await.unwrap_err().kind, ErrorKind::Syntax);

        let quotes = format!("{}x", ">".repeat(1000));
        assert_eq!(compile(&quotes, &registry).await.unwrap_err().kind, ErrorKind::Parse);
    }

    #[tokio::test]
    async fn test_undefined_variable_is_runtime_error() {
        let err = compile("# Title\n\nHello {name}", &ComponentRegistry::with_builtins())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Runtime);
        assert_eq!(err.message, "3:8: name is not defined");
    }

    #[tokio::test]
    async fn test_rejected_props_are_runtime_errors() {
        let err = compile("<Callout type=\"loud\">Hi</Callout>", &ComponentRegistry::with_builtins())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Runtime);
        assert!(err.message.contains("loud"), "message: {}", err.message);
    }

    #[tokio::test]
    async fn test_same_source_compiles_to_equal_trees() {
        let registry = ComponentRegistry::with_builtins();
        let source = "# Guide\n\n<Callout type=\"tip\">Use {2 * 21}</Callout>";

        let first = compile(source, &registry).await.unwrap();
        let second = compile(source, &registry).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_panicking_component_is_runtime_error() {
        let registry = ComponentRegistry::with_builtins();
        registry
            .register(ComponentDescriptor::new(
                "Explode",
                |_: &livemark_evaluator::Props, _: Vec<VNode>| -> Result<VNode, RenderError> {
                    panic!("component exploded")
                },
            ))
            .unwrap();

        let err = compile("<Explode />", &registry).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Runtime);
        assert_eq!(err.message, "Compilation panicked: component exploded");
    }

    #[tokio::test]
    async fn test_cache_is_reused_without_changing_output() {
        let pipeline = Pipeline::new(ComponentRegistry::with_builtins()).with_cache(8);
        let source: SourceText = Arc::from("# Cached\n\nBody");

        let first = pipeline.compile(source.clone()).await.unwrap();
        let second = pipeline.compile(source).await.unwrap();
        assert_eq!(first, second);

        let stats = pipeline.cache().unwrap().stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn test_registration_is_seen_by_next_compile() {
        let registry = ComponentRegistry::with_builtins();
        let pipeline = Pipeline::new(registry.clone());
        let source: SourceText = Arc::from("<Hero title=\"Hi\" />");

        let before = pipeline.compile(source.clone()).await.unwrap();
        assert_eq!(before.unknown_tags(), vec!["Hero".to_string()]);

        registry
            .register_custom(&hero_spec())
            .unwrap();

        let after = pipeline.compile(source).await.unwrap();
        assert!(after.unknown_tags().is_empty());
    }

    fn hero_spec() -> CustomComponentSpec {
        CustomComponentSpec {
            name: "Hero".to_string(),
            label: "Hero banner".to_string(),
            template: "<Hero title=\"\" />".to_string(),
            description: None,
        }
    }

    #[test]
    fn test_registry_is_read_after_parsing() {
        let registry = ComponentRegistry::with_builtins();
        let source = "# Launch\n\n<Hero title=\"Hi\" />";

        let module = load_module(source, None).unwrap();
        registry.register_custom(&hero_spec()).unwrap();
        let tree = instantiate_module(source, &module, &registry, UnknownTagFallback::Label).unwrap();

        assert!(tree.unknown_tags().is_empty());
        assert!(matches!(&tree.nodes[1], VNode::Component { name, .. } if name == "Hero"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_registration_during_compile_is_seen() {
        let registry = ComponentRegistry::with_builtins();
        let pipeline = Pipeline::new(registry.clone());

        let mut source = "Some *paragraph* with `code` and {1 + 2}.\n\n".repeat(20_000);
        source.push_str("<Hero title=\"Hi\" />\n");
        let task = tokio::spawn(async move { pipeline.compile(Arc::from(source)).await });

        registry.register_custom(&hero_spec()).unwrap();

        let tree = task.await.unwrap().unwrap();
        assert!(tree.unknown_tags().is_empty());
        assert!(matches!(tree.nodes.last(), Some(VNode::Component { name, .. }) if name == "Hero"));
    }
}
