mod context;
mod remap;
pub mod transforms;

pub use context::*;
pub use remap::*;
pub use transforms::{all_transforms, create_transform, Transform};

use tracing::{span, trace, Level};

///
/// run_transforms
///
/// Runs each transform over the context, in the order given, then applies the
/// remaps they collected. Returns the number of rewritten connections.
pub fn run_transforms(ctx: &mut Context, transforms: &[Box<dyn Transform>]) -> usize {
    for transform in transforms {
        let span = span!(Level::INFO, "transform", name = transform.name());
        let _enter = span.enter();
        trace!("entities before: {}", ctx.graph().len());
        transform.run(ctx);
    }
    ctx.apply_io_remaps()
}
