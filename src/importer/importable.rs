use std::sync::Arc;

use crate::{
    importer::{Attr, ModuleRegistry, Namespace},
    Error, Result,
};

/// Resolves a dotted path such as `"collections.abc.Hashable"` through the global registry.
///
/// See [`get_importable_in`].
///
/// # Errors
/// As [`get_importable_in`].
pub fn get_importable(path: &str, validate: Option<&dyn Fn(&Attr) -> bool>) -> Result<Attr> {
    get_importable_in(&ModuleRegistry::global(), path, validate)
}

/// Resolves a dotted path through `registry`.
///
/// The head component is imported as a unit. Every following component is read as an
/// attribute of the previous object; when that object is a [`Namespace`] lacking the
/// attribute, the dotted prefix is imported as a unit instead. The final object is passed to
/// `validate`, if given.
///
/// # Errors
/// - [`Error::Value`] for an empty path or an empty component
/// - [`Error::ModuleNotFound`] when the head unit is unknown
/// - [`Error::Attribute`] when a component cannot be found
/// - [`Error::Validation`] when `validate` returns `false`
///
/// # Examples
///
/// ```rust
/// use nanoutils::importer::{get_importable_in, Attr, ModuleRegistry, Namespace};
///
/// let registry = ModuleRegistry::new();
/// registry.register_loader("math", |name: &str| Ok(Namespace::new(name).with_attr("tau", 6.25_f64)));
///
/// let tau = get_importable_in(&registry, "math.tau", Some(&|attr: &Attr| attr.is::<f64>()))?;
/// assert_eq!(*tau.downcast::<f64>().unwrap(), 6.25);
/// # Ok::<(), nanoutils::Error>(())
/// ```
pub fn get_importable_in(
    registry: &ModuleRegistry,
    path: &str,
    validate: Option<&dyn Fn(&Attr) -> bool>,
) -> Result<Attr> {
    let mut parts = path.split('.');
    let head = parts.next().unwrap_or_default();
    if head.is_empty() {
        return Err(Error::Value(format!("invalid importable path: '{path}'")));
    }

    let mut dotted = head.to_string();
    let mut current: Attr = registry.import(head)?;

    for part in parts {
        if part.is_empty() {
            return Err(Error::Value(format!("invalid importable path: '{path}'")));
        }
        let parent = dotted.clone();
        dotted.push('.');
        dotted.push_str(part);

        let Ok(namespace) = current.clone().downcast::<Namespace>() else {
            return Err(Error::attribute(parent, part));
        };
        current = match namespace.get(part) {
            Some(value) => value,
            None if registry.can_import(&dotted) => {
                let unit: Arc<Namespace> = registry.import(&dotted)?;
                unit as Attr
            }
            None => return Err(Error::attribute(namespace.name(), part)),
        };
    }

    if let Some(validate) = validate {
        if !validate(&current) {
            return Err(Error::Validation(format!(
                "passing '{path}' to the validator failed to return true"
            )));
        }
    }
    Ok(current)
}
