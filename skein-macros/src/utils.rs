use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Options accepted by `#[skein::main(...)]` and `#[skein::test(...)]`.
#[derive(Default)]
pub(crate) struct Options {
    worker_threads: Option<usize>,
    pools: Vec<(String, usize)>,
}

impl Options {
    /// Parses `worker_threads = N` and `pool(name = N)` entries.
    pub(crate) fn parse(attr: TokenStream) -> Result<Self, String> {
        let mut options = Options::default();
        let attr = attr.to_string();

        for part in split_top_level(&attr) {
            let part = part.trim();

            if part.is_empty() {
                continue;
            }

            if let Some(value) = part.strip_prefix("worker_threads") {
                let value = value.trim().trim_start_matches('=').trim();
                let threads = value
                    .parse::<usize>()
                    .map_err(|_| format!("invalid worker_threads value `{value}`"))?;
                options.worker_threads = Some(threads);
            } else if let Some(inner) = part
                .strip_prefix("pool")
                .map(str::trim)
                .and_then(|rest| rest.strip_prefix('('))
                .and_then(|rest| rest.strip_suffix(')'))
            {
                let (name, threads) = inner
                    .split_once('=')
                    .ok_or_else(|| format!("expected `pool(name = N)`, found `{part}`"))?;
                let threads = threads
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| format!("invalid thread count in `{part}`"))?;
                options.pools.push((name.trim().to_string(), threads));
            } else {
                return Err(format!("unknown option `{part}`"));
            }
        }

        Ok(options)
    }

    /// Source of an expression building the runtime.
    pub(crate) fn builder(&self) -> String {
        let mut builder = String::from("::skein::RuntimeBuilder::new()");

        if let Some(n) = self.worker_threads {
            builder.push_str(&format!(".worker_threads({n})"));
        }
        for (name, threads) in &self.pools {
            builder.push_str(&format!(".pool({name:?}, {threads})"));
        }

        builder.push_str(".build().expect(\"failed to build the skein runtime\")");
        builder
    }
}

/// Splits on commas that are not nested in parentheses.
fn split_top_level(source: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in source.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&source[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    parts.push(&source[start..]);
    parts
}

/// Drops the `async` keyword and swaps the function body for the one
/// produced by `wrap`, which receives the original body as source text.
pub(crate) fn rewrite_body(
    item: TokenStream,
    wrap: impl FnOnce(String) -> String,
) -> Result<Vec<TokenTree>, String> {
    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    let is_async = |t: &TokenTree| matches!(t, TokenTree::Ident(id) if id.to_string() == "async");
    let Some(async_pos) = tokens.iter().position(is_async) else {
        return Err("the function must be `async`".into());
    };
    tokens.remove(async_pos);

    let Some(pos) = tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
    else {
        return Err("expected a function body".into());
    };

    let body = match &tokens[pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => unreachable!(),
    };

    let stream = wrap(body)
        .parse::<TokenStream>()
        .map_err(|err| format!("failed to expand the function body: {err}"))?;
    tokens[pos] = TokenTree::Group(Group::new(Delimiter::Brace, stream));

    Ok(tokens)
}

pub(crate) fn compile_error(message: &str) -> TokenStream {
    format!("::core::compile_error!({message:?});")
        .parse()
        .unwrap_or_default()
}
