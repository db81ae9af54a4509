//! Installation of native classes into an engine context.

use crate::capability::{CapabilityTable, NativeClass};
use crate::host_functions::SharedHostCalls;
use rquickjs::{Ctx, Exception, Function, Object};
use std::rc::Rc;
use tracing::debug;

/// Register `class` on the global object of `ctx`.
///
/// The namespace object is created if absent. The constructor returns a
/// fresh object carrying one function per table entry; each function holds
/// a reference to the native object and records its call in `calls`.
pub(crate) fn install<'js, T: 'static>(
    ctx: &Ctx<'js>,
    class: NativeClass<T>,
    calls: SharedHostCalls,
) -> rquickjs::Result<()> {
    let globals = ctx.globals();
    let (namespace_name, class_name, constructor, methods) = class.into_parts();

    let namespace = match globals.get::<_, Option<Object<'js>>>(namespace_name.as_str())? {
        Some(existing) => existing,
        None => {
            let created = Object::new(ctx.clone())?;
            globals.set(namespace_name.as_str(), created.clone())?;
            created
        }
    };

    let methods = Rc::new(methods);
    let constructor = Rc::new(constructor);

    let factory = Function::new(
        ctx.clone(),
        move |ctx: Ctx<'js>, flag: bool| -> rquickjs::Result<Object<'js>> {
            let native = (**constructor)(flag).map_err(|e| throw(&ctx, &e.to_string()))?;
            instantiate(&ctx, Rc::new(native), &methods, &calls)
        },
    )?
    .with_name(class_name.as_str())?;
    factory.set_constructor(true);

    namespace.set(class_name.as_str(), factory)?;

    debug!(
        namespace = %namespace_name,
        class = %class_name,
        "Installed native class"
    );

    Ok(())
}

fn instantiate<'js, T: 'static>(
    ctx: &Ctx<'js>,
    native: Rc<T>,
    methods: &CapabilityTable<T>,
    calls: &SharedHostCalls,
) -> rquickjs::Result<Object<'js>> {
    let object = Object::new(ctx.clone())?;

    for (name, method) in methods.iter() {
        let native = Rc::clone(&native);
        let calls = Rc::clone(calls);
        let method_name = name.to_string();

        let func = Function::new(ctx.clone(), move |ctx: Ctx<'js>| -> rquickjs::Result<String> {
            calls
                .record(&method_name)
                .map_err(|e| throw(&ctx, &e.to_string()))?;
            method(&native).map_err(|e| throw(&ctx, &e.to_string()))
        })?
        .with_name(name)?;

        object.set(name, func)?;
    }

    Ok(object)
}

fn throw(ctx: &Ctx<'_>, message: &str) -> rquickjs::Error {
    Exception::throw_message(ctx, message)
}
