pub mod builtins;
pub mod evaluator;
pub mod module;
pub mod registry;
pub mod value;
pub mod vdom;

#[cfg(test)]
mod tests_expressions;

#[cfg(test)]
mod tests_instantiate;

pub use evaluator::{instantiate, EvalContext, EvalError, EvalResult, Evaluator, MAX_STRING_LENGTH};
pub use module::{compile_module, CompiledModule, ModuleError, ModuleResult, Op, PropOp, PropValue};
pub use registry::{
    ComponentDescriptor, ComponentOrigin, ComponentRegistry, CustomComponentSpec, DuplicatePolicy,
    RegisterOutcome, RegistryError, RegistryResult, RegistrySnapshot, RenderComponent, RenderError,
};
pub use value::Value;
pub use vdom::{DocumentTree, Props, UnknownTagFallback, VNode};
