use vmf::Output;

///
/// IoRemap
///
/// A request from a transform to rewrite connections aimed at `name`. Transforms
/// only produce these; the context applies them once every transform has run.
#[derive(Clone, Debug, PartialEq)]
pub enum IoRemap {
    // Connections firing `output.output` on `name` should fire `output` instead.
    // With `remove` unset the original connection is kept alongside the new one.
    Rewire {
        name: String,
        output: Output,
        remove: bool,
    },

    // Connections firing `input` on `name` are deleted
    Remove {
        name: String,
        input: String,
    },
}

impl IoRemap {
    pub fn input(&self) -> &str {
        match self {
            IoRemap::Rewire { output, .. } => &output.output,
            IoRemap::Remove { input, .. } => input,
        }
    }
}
