pub mod coerce;
pub mod context;
pub mod detection;
pub mod dispatch;
pub mod platform;
pub mod plugin;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod subcommand;
pub mod tokenizer;
pub mod types;

#[cfg(test)]
mod test_support;

pub use context::{CommandContext, InvocationInput, StructuredInput, TextInput};
pub use detection::{detect_command, detect_structured};
pub use dispatch::{
    CommandDispatcher, CommandHandler, ExecutionOutcome, ExecutionStage, GENERIC_FAILURE,
};
pub use platform::Platform;
pub use plugin::{Flow, Plugin, PluginScope, PluginScopes, RegisterDecision};
pub use registry::{CommandRegistry, LoadError};
pub use resolver::{ArgumentResolver, RawInput, ResolvedArguments, custom};
pub use schema::{
    CommandSchema, OptionKind, RegisteredCommand, RegistrationReport, SchemaBuilder, SchemaNode,
    SchemaOption, SchemaRegistrar,
};
pub use subcommand::{SubcommandRoute, method_name};
pub use tokenizer::{Token, tokenize, tokenize_values};
pub use types::{
    ArgChoice, ArgKind, ArgumentDescriptor, ArgumentSet, CommandBlueprint, CommandDefinition,
    CommandDescriptor, CommandEntry, CommandLevel, CommandMetadata, CommandOptions,
    SubcommandGroupOptions, SubcommandOptions,
};
