// strategy.rs
use serde_json::Value;
use std::ops::ControlFlow;
use tracing::debug;

/// One way of reading a field. Strategies return `None` on any miss or parse
/// failure so the next one in the chain gets its turn.
pub struct Strategy<'a, I: ?Sized, T> {
    pub name: &'static str,
    run: Box<dyn Fn(&I) -> Option<T> + 'a>,
}

impl<'a, I: ?Sized, T> Strategy<'a, I, T> {
    pub fn new(name: &'static str, run: impl Fn(&I) -> Option<T> + 'a) -> Self {
        Self {
            name,
            run: Box::new(run),
        }
    }

    pub fn apply(&self, input: &I) -> Option<T> {
        (self.run)(input)
    }
}

/// Runs `chain` in order and returns the first hit. Strategies after the
/// winning one are never called.
pub fn first_match<I: ?Sized, T>(field: &str, input: &I, chain: &[Strategy<'_, I, T>]) -> Option<T> {
    for strategy in chain {
        if let Some(value) = strategy.apply(input) {
            debug!(field, strategy = strategy.name, "field resolved");
            return Some(value);
        }
    }
    debug!(field, "no strategy matched");
    None
}

/// Depth-first walk over nested objects and arrays. `visit` sees every node and
/// stops the walk by returning `Break`.
pub fn walk_json<'v, B>(
    value: &'v Value,
    visit: &mut impl FnMut(&'v Value) -> ControlFlow<B>,
) -> ControlFlow<B> {
    visit(value)?;
    match value {
        Value::Object(map) => {
            for child in map.values() {
                walk_json(child, visit)?;
            }
        }
        Value::Array(items) => {
            for child in items {
                walk_json(child, visit)?;
            }
        }
        _ => {}
    }
    ControlFlow::Continue(())
}

/// Returns the first node for which `pick` yields a value.
pub fn find_in_json<'v, T>(value: &'v Value, mut pick: impl FnMut(&'v Value) -> Option<T>) -> Option<T> {
    let flow = walk_json(value, &mut |node| match pick(node) {
        Some(found) => ControlFlow::Break(found),
        None => ControlFlow::Continue(()),
    });
    match flow {
        ControlFlow::Break(found) => Some(found),
        ControlFlow::Continue(()) => None,
    }
}
