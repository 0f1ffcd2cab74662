use boa_engine::{
    js_string, object::ObjectInitializer, property::Attribute, Context, JsError, JsResult,
    JsString, JsValue, NativeFunction, Source,
};
use boa_gc::{Finalize, Trace};
use tracing::{debug, warn};

use crate::{capture::ConsoleSink, error::Error, languages::NativeExecutor};

const CONSOLE_METHODS: &[&str] = &["log", "info", "warn", "error", "debug"];

/// Evaluates JavaScript with an embedded ECMAScript engine.
///
/// Each call gets a fresh `Context`, so globals never leak from one run into the next and
/// the `console` object is bound to that run's sink only.
#[derive(Debug, Clone, Default)]
pub struct JavaScriptExecutor;

impl JavaScriptExecutor {
    pub fn new() -> Self {
        Self
    }

    fn context(&self, console: &ConsoleSink) -> Result<Context, Error> {
        let mut context = Context::default();
        install_console(&mut context, console)
            .map_err(|e| Error::System(format!("Failed to install console: {}", e)))?;
        Ok(context)
    }
}

impl NativeExecutor for JavaScriptExecutor {
    fn execute(&self, code: &str, console: &ConsoleSink) -> Result<(), Error> {
        let mut context = self.context(console)?;

        // The completion value is dropped: a script's result is what it printed.
        let completion = context.eval(Source::from_bytes(code));
        let jobs = context.run_jobs();

        match (completion, jobs) {
            (Ok(_), Ok(())) => {
                debug!(lines = console.len(), "JavaScript evaluation finished");
                Ok(())
            }
            (Ok(_), Err(e)) => Err(Error::Interpreter(error_message(&e, &mut context))),
            (Err(e), jobs) => {
                if let Err(job_error) = jobs {
                    warn!("Pending jobs failed after script error: {}", job_error);
                }
                Err(Error::Interpreter(error_message(&e, &mut context)))
            }
        }
    }
}

#[derive(Clone, Trace, Finalize)]
struct ConsoleBinding {
    #[unsafe_ignore_trace]
    sink: ConsoleSink,
}

fn install_console(context: &mut Context, sink: &ConsoleSink) -> JsResult<()> {
    let mut console = ObjectInitializer::new(context);
    for method in CONSOLE_METHODS {
        console.function(
            NativeFunction::from_copy_closure_with_captures(
                console_write,
                ConsoleBinding { sink: sink.clone() },
            ),
            JsString::from(*method),
            0,
        );
    }
    let console = console.build();

    context.register_global_property(js_string!("console"), console, Attribute::all())
}

/// One call, one line. Arguments are stringified and separated by a space.
fn console_write(
    _this: &JsValue,
    args: &[JsValue],
    binding: &ConsoleBinding,
    context: &mut Context,
) -> JsResult<JsValue> {
    let mut parts = Vec::with_capacity(args.len());
    for arg in args {
        parts.push(arg.to_string(context)?.to_std_string_escaped());
    }
    binding.sink.emit(parts.join(" "));
    Ok(JsValue::undefined())
}

/// Native errors contribute only their message; anything else thrown is stringified.
fn error_message(error: &JsError, context: &mut Context) -> String {
    if let Ok(native) = error.try_native(context) {
        return native.message().to_string();
    }

    error
        .to_opaque(context)
        .to_string(context)
        .map(|s| s.to_std_string_escaped())
        .unwrap_or_else(|_| error.to_string())
}
