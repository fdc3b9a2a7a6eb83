//! Translation between source-level and internal type names.
//!
//! | Source           | Internal          | Descriptor        |
//! |------------------|-------------------|-------------------|
//! | `a.b.C`          | `a/b/C`           | `La/b/C;`         |
//! | `a.b.C[][]`      | `[[La/b/C;`       | `[[La/b/C;`       |
//! | `int`            | `int`             | `I`               |
//! | `int[]`          | `[I`              | `[I`              |
//!
//! Internal names are what the host's class lookup expects. Primitive types
//! keep their source name, since hosts do not name them any other way.

use narcissus_core::PrimitiveKind;

/// Convert a dotted source name with optional `[]` suffixes to internal form.
///
/// ```
/// use narcissus::names::internal_name;
///
/// assert_eq!(internal_name("java.lang.String"), "java/lang/String");
/// assert_eq!(internal_name("com.xyz.MyClass[][]"), "[[Lcom/xyz/MyClass;");
/// assert_eq!(internal_name("int[]"), "[I");
/// ```
pub fn internal_name(source: &str) -> String {
    let mut base = source.trim();
    let mut dims = 0;
    while let Some(stripped) = base.strip_suffix("[]") {
        base = stripped;
        dims += 1;
    }

    let base = base.replace('.', "/");
    if dims == 0 {
        return base;
    }
    let mut name = "[".repeat(dims);
    name.push_str(&element_descriptor(&base));
    name
}

/// Convert an internal name back to a dotted source name.
pub fn source_name(internal: &str) -> String {
    let dims = internal.chars().take_while(|&c| c == '[').count();
    if dims == 0 {
        return internal.replace('/', ".");
    }
    let element = &internal[dims..];
    let mut name = match element.strip_prefix('L').and_then(|e| e.strip_suffix(';')) {
        Some(class) => class.replace('/', "."),
        None => descriptor_kind(element)
            .map(|k| k.name().to_string())
            .unwrap_or_else(|| element.to_string()),
    };
    name.push_str(&"[]".repeat(dims));
    name
}

/// Type descriptor of an internal name (`int` -> `I`, `a/b/C` -> `La/b/C;`).
pub fn type_descriptor(internal: &str) -> String {
    if internal.starts_with('[') {
        internal.to_string()
    } else {
        element_descriptor(internal)
    }
}

/// Method descriptor for parameter and return types given by internal name.
///
/// ```
/// use narcissus::names::method_descriptor;
///
/// assert_eq!(method_descriptor(&["int", "java/lang/String"], "void"), "(ILjava/lang/String;)V");
/// ```
pub fn method_descriptor(params: &[&str], ret: &str) -> String {
    let mut descriptor = String::from("(");
    for param in params {
        descriptor.push_str(&type_descriptor(param));
    }
    descriptor.push(')');
    descriptor.push_str(&type_descriptor(ret));
    descriptor
}

/// Internal name of the array type whose component is `component`.
pub fn array_name(component: &str) -> String {
    format!("[{}", type_descriptor(component))
}

/// Internal name of the component of an array type. `None` if not an array.
pub fn component_name(array: &str) -> Option<String> {
    let element = array.strip_prefix('[')?;
    if element.starts_with('[') {
        return Some(element.to_string());
    }
    if let Some(class) = element.strip_prefix('L').and_then(|e| e.strip_suffix(';')) {
        return Some(class.to_string());
    }
    descriptor_kind(element)
        .filter(|k| !k.is_void())
        .map(|k| k.name().to_string())
}

fn element_descriptor(base: &str) -> String {
    match PrimitiveKind::from_name(base) {
        Some(kind) => kind.descriptor().to_string(),
        None => format!("L{base};"),
    }
}

fn descriptor_kind(descriptor: &str) -> Option<PrimitiveKind> {
    match descriptor.as_bytes() {
        [byte] => PrimitiveKind::try_from(*byte).ok(),
        _ => None,
    }
}
