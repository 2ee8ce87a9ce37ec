//! Reference input/output modules (`file`, `generator`, `stdout`) and wire
//! codecs (`plain`, `line`, `json`, `json_lines`, `json_pretty`, `dots`).

pub mod codecs;
pub mod file_input;
pub mod generator_input;
pub mod stdout_output;

use std::sync::Arc;

use spartan_core::registry::{CodecRegistry, Registry};
use spartan_core::traits::{Input, Output};

pub use file_input::FileInput;
pub use generator_input::GeneratorInput;
pub use stdout_output::StdoutOutput;

/// Registers the `file` and `generator` inputs. Called once from the CLI
/// binary at startup, before any config file is parsed.
pub fn register_inputs(registry: &Registry<Box<dyn Input>>) -> anyhow::Result<()> {
    registry.register("file", |opts| Ok(Box::new(FileInput::new(opts)?) as Box<dyn Input>))?;
    registry.register("generator", |opts| Ok(Box::new(GeneratorInput::new(opts)?) as Box<dyn Input>))?;
    Ok(())
}

/// Registers the `stdout` output. The output factory needs the already
/// populated codec registry, since `stdout`'s `codec` option resolves
/// against it at construction time.
pub fn register_outputs(registry: &Registry<Box<dyn Output>>, codecs: Arc<CodecRegistry>) -> anyhow::Result<()> {
    registry.register("stdout", move |opts| {
        Ok(Box::new(StdoutOutput::new(opts, &codecs)?) as Box<dyn Output>)
    })?;
    Ok(())
}
