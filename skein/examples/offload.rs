//! Keeps blocking file reads off the default pool.

use skein::{Error, Handle, RuntimeBuilder};

fn main() -> skein::Result<()> {
    let runtime = RuntimeBuilder::new()
        .worker_threads(2)
        .pool("io", 1)
        .build()?;

    let handle: Handle = runtime.handle().clone();

    let length = runtime.try_block_on(async move {
        let bytes = handle
            .offload("io", || std::fs::read("Cargo.toml"))
            .await?
            .map_err(Error::failed)?;

        Ok::<_, skein::Error>(bytes.len())
    })??;

    println!("Cargo.toml is {length} bytes");
    Ok(())
}

