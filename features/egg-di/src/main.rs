use std::{
    error::Error,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use egg_di::{generator, hatch_eggs, Args, DynError, Egg, Provider, Signature};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Connection {
    tenant: String,
    open: Arc<AtomicBool>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let get_base_value = Provider::plain("get_base_value", Signature::new(), |_| Ok(10_i32));
    let get_doubled = Provider::suspending(
        "get_doubled",
        Signature::new().inject("base", Egg::new(&get_base_value)),
        |kwargs| async move { Ok::<_, DynError>(*kwargs.get::<i32>("base")? * 2) },
    );

    let open = Arc::new(AtomicBool::new(false));
    let flag = open.clone();
    let connection = Provider::scoped(
        "connection",
        Signature::new().param("tenant_name"),
        move |kwargs| {
            let setup_flag = flag.clone();
            let teardown_flag = flag.clone();
            let tenant = kwargs.cloned::<String>("tenant_name");
            generator(
                async move {
                    setup_flag.store(true, Ordering::SeqCst);
                    Ok::<_, DynError>(Connection {
                        tenant: tenant?,
                        open: setup_flag,
                    })
                },
                move || async move {
                    teardown_flag.store(false, Ordering::SeqCst);
                    Ok::<_, DynError>(())
                },
            )
        },
    );

    let func = hatch_eggs(
        Signature::new()
            .param("tenant_name")
            .inject("value", Egg::new(&get_doubled))
            .inject("connection", Egg::new(&connection)),
        |kwargs| async move {
            let connection = kwargs.get::<Connection>("connection")?;
            let value = *kwargs.get::<i32>("value")? + 5;
            Ok::<_, DynError>(format!(
                "{} got {value} (connection open: {})",
                connection.tenant,
                connection.open.load(Ordering::SeqCst)
            ))
        },
    );

    func.check()?;

    let result = func.call_blocking(Args::new().arg("acme".to_string()))?;
    println!("{result}");
    println!("connection open after call: {}", open.load(Ordering::SeqCst));

    Ok(())
}
