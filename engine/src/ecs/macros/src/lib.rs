mod settings;

use proc_macro::TokenStream;

/// Declare an ECS settings type: its components, tags and signatures.
///
/// Component columns are grown with default rows, so every component type
/// must implement `Default`. Tags have no such requirement. A signature
/// member that is neither a declared component nor a declared tag, or any
/// duplicate declaration, is a compile error.
///
/// ```ignore
/// ecs_settings! {
///     pub struct Game {
///         components: [Position, Velocity],
///         tags: [Frozen],
///         signatures: {
///             Movable: [Position, Velocity],
///             Still: [Position, Frozen],
///         },
///         options: Options { start_capacity: 128, ..Options::default() },
///     }
/// }
/// ```
#[proc_macro]
pub fn ecs_settings(input: TokenStream) -> TokenStream {
    settings::ecs_settings(input)
}
