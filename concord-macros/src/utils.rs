use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Options accepted by `#[concord::main]` and `#[concord::test]`.
#[derive(Default)]
pub(crate) struct RuntimeArgs {
    pub(crate) worker_threads: Option<usize>,
}

impl RuntimeArgs {
    /// Parses a comma-separated list of `key = value` pairs.
    pub(crate) fn parse(attr: TokenStream) -> Result<Self, String> {
        let mut args = RuntimeArgs::default();
        let attr = attr.to_string();

        for part in attr.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((key, value)) = part.split_once('=') else {
                return Err(format!("expected `key = value`, found `{part}`"));
            };

            match key.trim() {
                "worker_threads" => {
                    let n = value
                        .trim()
                        .parse::<usize>()
                        .map_err(|_| format!("`worker_threads` must be an integer, found `{}`", value.trim()))?;

                    if n == 0 {
                        return Err("`worker_threads` must be greater than zero".to_string());
                    }

                    args.worker_threads = Some(n);
                }
                other => return Err(format!("unknown attribute `{other}`")),
            }
        }

        Ok(args)
    }

    /// Source of the expression building the runtime.
    pub(crate) fn builder(&self) -> String {
        let mut builder = String::from("::concord::RuntimeBuilder::new()");

        if let Some(n) = self.worker_threads {
            builder.push_str(&format!(".worker_threads({n})"));
        }

        builder.push_str(".build()");
        builder
    }
}

/// Rewrites `async fn name() { body }` into
/// `fn name() { <runtime>.block_on(async move { body }) }`.
pub(crate) fn wrap_in_runtime(item: TokenStream, args: &RuntimeArgs) -> Result<Vec<TokenTree>, String> {
    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    let Some(async_pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    else {
        return Err("the function must be `async`".to_string());
    };
    tokens.remove(async_pos);

    let Some(pos) = tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
    else {
        return Err("expected a function body".to_string());
    };

    let TokenTree::Group(body) = &tokens[pos] else {
        return Err("expected a function body".to_string());
    };

    let block = format!(
        "{{
            let runtime = {};
            runtime.block_on(async move {{ {} }})
        }}",
        args.builder(),
        body.stream()
    );

    let stream = block.parse::<TokenStream>().map_err(|err| err.to_string())?;
    tokens[pos] = TokenTree::Group(Group::new(Delimiter::Brace, stream));

    Ok(tokens)
}

pub(crate) fn compile_error(message: &str) -> TokenStream {
    format!("::core::compile_error!({message:?});")
        .parse()
        .unwrap_or_default()
}
