pub mod comp_relay;

use tracing::warn;

use crate::Context;

use self::comp_relay::CompRelay;

///
/// Transform
///
/// A single rewrite rule over the map. Lower priorities run first.
pub trait Transform {
    fn name(&self) -> &'static str;

    fn priority(&self) -> i32 {
        0
    }

    fn run(&self, ctx: &mut Context);
}

pub fn create_transform(name: &str) -> Option<Box<dyn Transform>> {
    match name.to_ascii_lowercase().as_str() {
        "comp_relay" => Some(Box::new(CompRelay::new())),
        _ => {
            warn!("Unknown transform: {}", name);
            None
        }
    }
}

pub fn all_transforms() -> Vec<Box<dyn Transform>> {
    let mut transforms: Vec<Box<dyn Transform>> = vec![Box::new(CompRelay::new())];
    transforms.sort_by_key(|transform| transform.priority());
    transforms
}
