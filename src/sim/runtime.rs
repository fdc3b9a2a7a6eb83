//! The in-memory host runtime.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{error, trace};
use narcissus_core::{
    AccessorId, CallAddress, HostAccess, HostError, HostRuntime, MemberDescriptor, MemberKind,
    Modifiers, ObjectRef, PrimitiveArray, PrimitiveKind, PrimitiveValue, ReturnValue, Slot,
    TypeHandle, TypedArgumentBuffer,
};
use rustc_hash::{FxHashMap, FxHashSet};

use super::bootstrap;
use super::class::{ClassBuilder, ClassDef, ClassKind, MethodBody, MethodDef};
use super::heap::{ObjectData, ObjectHeap, SimObject};
use crate::names::{array_name, component_name, method_descriptor, source_name, type_descriptor};

pub(crate) const OBJECT: &str = "java/lang/Object";
pub(crate) const CLASS: &str = "java/lang/Class";
pub(crate) const STRING: &str = "java/lang/String";
pub(crate) const THROWABLE: &str = "java/lang/Throwable";

/// Elements of a host array, copied out.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayElements {
    Primitive(PrimitiveArray),
    Objects(Vec<Option<ObjectRef>>),
}

// ============================================================================
// State
// ============================================================================

#[derive(Default)]
struct SimState {
    classes: FxHashMap<TypeHandle, ClassDef>,
    /// Internal name of every handle ever handed out, defined or not
    names: FxHashMap<TypeHandle, String>,
    heap: ObjectHeap,
    statics: FxHashMap<CallAddress, Slot>,
    bodies: FxHashMap<CallAddress, MethodBody>,
    class_objects: FxHashMap<TypeHandle, ObjectRef>,
    /// Outstanding long-lived handles from resolution
    pinned: FxHashMap<TypeHandle, usize>,
    pending: Option<ObjectRef>,
}

impl SimState {
    /// Handle for an internal name, creating array classes on demand.
    fn handle_for(&mut self, name: &str) -> TypeHandle {
        let ty = TypeHandle::from_name(name);
        self.names.entry(ty).or_insert_with(|| name.to_string());
        if !self.classes.contains_key(&ty)
            && let Some(component) = component_name(name)
        {
            let component = self.handle_for(&component);
            let object = TypeHandle::from_name(OBJECT);
            self.classes.insert(
                ty,
                ClassDef::synthetic(
                    name.to_string(),
                    ClassKind::Array { component },
                    Some(object),
                ),
            );
        }
        ty
    }

    /// Handle of an existing class; array classes only if their element exists.
    fn lookup(&mut self, name: &str) -> Option<TypeHandle> {
        let ty = TypeHandle::from_name(name);
        if self.classes.contains_key(&ty) {
            return Some(ty);
        }
        let component = component_name(name)?;
        self.lookup(&component)?;
        Some(self.handle_for(name))
    }

    fn class(&self, ty: TypeHandle) -> Result<&ClassDef, HostError> {
        self.classes.get(&ty).ok_or(HostError::UnknownType(ty))
    }

    fn object(&self, obj: ObjectRef) -> Result<&SimObject, HostError> {
        self.heap.get(obj).ok_or(HostError::StaleReference(obj))
    }

    fn object_mut(&mut self, obj: ObjectRef) -> Result<&mut SimObject, HostError> {
        self.heap.get_mut(obj).ok_or(HostError::StaleReference(obj))
    }

    fn name_of(&self, ty: TypeHandle) -> Option<&str> {
        self.names.get(&ty).map(String::as_str)
    }

    fn primitive_kind(&self, ty: TypeHandle) -> Option<PrimitiveKind> {
        match self.classes.get(&ty)?.kind {
            ClassKind::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    fn zero_slot(&self, ty: TypeHandle) -> Slot {
        self.primitive_kind(ty)
            .and_then(PrimitiveValue::zero)
            .map_or(Slot::Reference(None), Slot::Primitive)
    }

    /// The class, then each superclass in turn.
    fn chain(&self, ty: TypeHandle) -> impl Iterator<Item = &ClassDef> + '_ {
        std::iter::successors(self.classes.get(&ty), |c| {
            c.superclass.and_then(|s| self.classes.get(&s))
        })
    }

    fn is_assignable(&self, from: TypeHandle, to: TypeHandle) -> bool {
        if from == to {
            return true;
        }
        let Some(def) = self.classes.get(&from) else {
            return false;
        };
        let object = TypeHandle::from_name(OBJECT);
        match def.kind {
            ClassKind::Primitive(_) => false,
            ClassKind::Array { component: from_c } => {
                if to == object {
                    return true;
                }
                match self.classes.get(&to).map(|c| c.kind) {
                    Some(ClassKind::Array { component: to_c }) => {
                        let primitive = self.primitive_kind(from_c).is_some()
                            || self.primitive_kind(to_c).is_some();
                        if primitive {
                            from_c == to_c
                        } else {
                            self.is_assignable(from_c, to_c)
                        }
                    }
                    _ => false,
                }
            }
            ClassKind::Class | ClassKind::Interface => {
                if to == object {
                    return true;
                }
                let mut visited = FxHashSet::default();
                let mut queue = VecDeque::from([from]);
                while let Some(ty) = queue.pop_front() {
                    if ty == to {
                        return true;
                    }
                    if !visited.insert(ty) {
                        continue;
                    }
                    if let Some(c) = self.classes.get(&ty) {
                        queue.extend(c.superclass);
                        queue.extend(c.interfaces.iter().copied());
                    }
                }
                false
            }
        }
    }

    fn class_object(&mut self, ty: TypeHandle) -> ObjectRef {
        if let Some(&obj) = self.class_objects.get(&ty)
            && self.heap.get(obj).is_some()
        {
            return obj;
        }
        let class = TypeHandle::from_name(CLASS);
        let obj = self.heap.allocate(SimObject {
            ty: class,
            data: ObjectData::Class(ty),
        });
        self.class_objects.insert(ty, obj);
        obj
    }

    /// Instance field slots of `ty` and all its superclasses, zeroed.
    fn instance_fields(&self, ty: TypeHandle) -> FxHashMap<CallAddress, Slot> {
        self.chain(ty)
            .flat_map(|c| c.fields.iter())
            .filter(|f| !f.is_static())
            .map(|f| (f.address, self.zero_slot(f.value_type)))
            .collect()
    }

    /// Body to run for `method` on a receiver whose runtime type is `ty`.
    fn dispatch(&self, ty: TypeHandle, method: &MemberDescriptor) -> Option<MethodBody> {
        self.chain(ty)
            .flat_map(|c| c.methods.iter())
            .filter(|m| {
                !m.descriptor.is_static()
                    && m.descriptor.name == method.name
                    && m.descriptor.parameter_types == method.parameter_types
            })
            .find_map(|m| self.bodies.get(&m.descriptor.address).cloned())
            .or_else(|| self.bodies.get(&method.address).cloned())
    }

    fn field_by_name(&self, ty: TypeHandle, name: &str) -> Option<MemberDescriptor> {
        self.chain(ty).find_map(|c| c.field_named(name)).cloned()
    }

    fn read(&self, obj: ObjectRef, field: &MemberDescriptor) -> Result<Slot, HostError> {
        match &self.object(obj)?.data {
            ObjectData::Instance(fields) => {
                fields
                    .get(&field.address)
                    .copied()
                    .ok_or_else(|| HostError::UnknownMember {
                        name: field.name.clone(),
                    })
            }
            _ => Err(HostError::invalid_operand(
                "get_field",
                format!("{obj} has no fields"),
            )),
        }
    }

    fn write(
        &mut self,
        obj: ObjectRef,
        field: &MemberDescriptor,
        value: Slot,
    ) -> Result<(), HostError> {
        let name = field.name.clone();
        match &mut self.object_mut(obj)?.data {
            ObjectData::Instance(fields) => match fields.get_mut(&field.address) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(HostError::UnknownMember { name }),
            },
            _ => Err(HostError::invalid_operand(
                "set_field",
                format!("{obj} has no fields"),
            )),
        }
    }
}

// ============================================================================
// SimRuntime
// ============================================================================

/// An in-memory object runtime with JVM-like classes.
///
/// Implements [`HostRuntime`] and [`HostAccess`]. All state sits behind one
/// mutex that is never held while a method body runs, so bodies may call
/// back into the runtime.
pub struct SimRuntime {
    state: Mutex<SimState>,
}

impl Default for SimRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SimRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("SimRuntime")
            .field("classes", &state.classes.len())
            .field("heap", &state.heap)
            .field("pinned", &state.pinned.len())
            .finish()
    }
}

impl SimRuntime {
    /// Create a runtime with the well-known classes installed.
    pub fn new() -> Self {
        let rt = Self::empty();
        {
            let mut state = rt.lock();
            for kind in PrimitiveKind::ALL {
                let name = kind.name().to_string();
                let ty = TypeHandle::from_name(&name);
                state.names.insert(ty, name.clone());
                let class = ClassDef::synthetic(name, ClassKind::Primitive(kind), None);
                state.classes.insert(ty, class);
            }
        }
        if let Err(err) = bootstrap::install(&rt) {
            error!("failed to install well-known classes: {err}");
        }
        rt
    }

    fn empty() -> Self {
        Self {
            state: Mutex::new(SimState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // === Definition ===

    /// Install a class.
    pub fn define(&self, builder: ClassBuilder) -> Result<TypeHandle, HostError> {
        let mut state = self.lock();
        let ty = TypeHandle::from_name(&builder.name);
        if state.classes.contains_key(&ty) {
            return Err(HostError::other(format!(
                "class {} is already defined",
                source_name(&builder.name)
            )));
        }
        state.names.insert(ty, builder.name.clone());

        let is_interface = builder.is_interface();
        let superclass = match (&builder.superclass, is_interface) {
            (Some(name), _) => Some(state.handle_for(name)),
            (None, true) => None,
            (None, false) if builder.name == OBJECT => None,
            (None, false) => Some(state.handle_for(OBJECT)),
        };
        let interfaces = builder
            .interfaces
            .iter()
            .map(|name| state.handle_for(name))
            .collect();

        let mut fields = Vec::with_capacity(builder.fields.len());
        for spec in &builder.fields {
            let field_type = state.handle_for(&spec.type_name);
            let address =
                CallAddress::from_signature(ty, &spec.name, &type_descriptor(&spec.type_name));
            let field =
                MemberDescriptor::field(&spec.name, ty, spec.modifiers, field_type, address);
            if field.is_static() {
                let zero = state.zero_slot(field_type);
                state.statics.insert(address, zero);
            }
            fields.push(field);
        }

        let void = state.handle_for("void");
        let mut methods = Vec::with_capacity(builder.methods.len());
        for spec in builder.methods {
            let params: Vec<&str> = spec.params.iter().map(String::as_str).collect();
            let signature = method_descriptor(&params, &spec.ret);
            let parameter_types = spec.params.iter().map(|p| state.handle_for(p)).collect();
            let ret = state.handle_for(&spec.ret);
            let address = CallAddress::from_signature(ty, &spec.name, &signature);
            if let Some(body) = spec.body {
                state.bodies.insert(address, body);
            }
            methods.push(MethodDef {
                descriptor: MemberDescriptor::method(
                    spec.name,
                    ty,
                    spec.modifiers,
                    parameter_types,
                    ret,
                    address,
                ),
                signature,
            });
        }

        let mut constructor_specs = builder.constructors;
        if constructor_specs.is_empty() && !is_interface {
            let default: MethodBody = std::sync::Arc::new(
                |_: &SimRuntime, _: Option<ObjectRef>, _: &[Slot]| Ok(ReturnValue::Void),
            );
            constructor_specs.push(super::class::MethodSpec {
                name: "<init>".to_string(),
                params: Vec::new(),
                ret: "void".to_string(),
                modifiers: Modifiers::PUBLIC,
                body: Some(default),
            });
        }
        let mut constructors = Vec::with_capacity(constructor_specs.len());
        for spec in constructor_specs {
            let params: Vec<&str> = spec.params.iter().map(String::as_str).collect();
            let signature = method_descriptor(&params, "void");
            let parameter_types = spec.params.iter().map(|p| state.handle_for(p)).collect();
            let address = CallAddress::from_signature(ty, "<init>", &signature);
            if let Some(body) = spec.body {
                state.bodies.insert(address, body);
            }
            constructors.push(MethodDef {
                descriptor: MemberDescriptor::constructor(
                    ty,
                    spec.modifiers,
                    parameter_types,
                    void,
                    address,
                ),
                signature,
            });
        }

        let kind = if is_interface {
            ClassKind::Interface
        } else {
            ClassKind::Class
        };
        trace!("defined {} ({ty:?})", source_name(&builder.name));
        state.classes.insert(
            ty,
            ClassDef {
                name: builder.name,
                kind,
                modifiers: builder.modifiers,
                superclass,
                interfaces,
                fields,
                methods,
                constructors,
            },
        );
        Ok(ty)
    }

    /// Handle for a type name in source or internal form.
    ///
    /// The type need not be defined yet; array types are created on demand.
    pub fn type_named(&self, name: &str) -> TypeHandle {
        self.lock().handle_for(&crate::names::internal_name(name))
    }

    /// Class object of a type.
    pub fn class_object(&self, ty: TypeHandle) -> ObjectRef {
        self.lock().class_object(ty)
    }

    // === Objects ===

    /// Allocate a string.
    pub fn new_string(&self, value: &str) -> Result<ObjectRef, HostError> {
        let chars: Vec<u16> = value.encode_utf16().collect();
        let array = self.new_primitive_array(PrimitiveArray::Char(chars))?;
        let string = self.allocate_instance(TypeHandle::from_name(STRING))?;
        self.write(string, "value", Slot::Reference(Some(array)))?;
        Ok(string)
    }

    /// Contents of a string.
    pub fn string_value(&self, string: ObjectRef) -> Result<String, HostError> {
        let chars = match self.read(string, "value")? {
            Slot::Reference(Some(array)) => array,
            _ => {
                return Err(HostError::invalid_operand(
                    "string_value",
                    format!("{string} has no character data"),
                ));
            }
        };
        match self.array_elements(chars)? {
            ArrayElements::Primitive(PrimitiveArray::Char(units)) => {
                Ok(String::from_utf16_lossy(&units))
            }
            _ => Err(HostError::invalid_operand(
                "string_value",
                format!("{string} is not a string"),
            )),
        }
    }

    /// Allocate a boxed instance of the value's kind.
    pub fn new_boxed(&self, value: impl Into<PrimitiveValue>) -> Result<ObjectRef, HostError> {
        let value = value.into();
        let boxed = TypeHandle::from_name(&bootstrap::wrapper_name(value.kind()));
        let obj = self.allocate_instance(boxed)?;
        self.write(obj, "value", Slot::Primitive(value))?;
        Ok(obj)
    }

    /// Value held by a boxed instance.
    pub fn unboxed(&self, obj: ObjectRef) -> Result<PrimitiveValue, HostError> {
        match self.read(obj, "value")? {
            Slot::Primitive(value) => Ok(value),
            Slot::Reference(_) => Err(HostError::invalid_operand(
                "unboxed",
                format!("{obj} is not a boxed primitive"),
            )),
        }
    }

    /// Allocate a throwable with a message.
    pub fn new_throwable(&self, type_name: &str, message: &str) -> Result<ObjectRef, HostError> {
        let ty = self.type_named(type_name);
        let message = self.new_string(message)?;
        let obj = self.allocate_instance(ty)?;
        self.write(obj, "message", Slot::Reference(Some(message)))?;
        Ok(obj)
    }

    /// Build the error a method body returns to raise `throwable`.
    pub fn raise(&self, throwable: ObjectRef) -> HostError {
        match self.check_throwable(throwable) {
            Ok(()) => HostError::Thrown(throwable),
            Err(err) => err,
        }
    }

    /// Take the throwable raised by [`HostAccess::throw`], if any.
    pub fn pending_throwable(&self) -> Option<ObjectRef> {
        self.lock().pending.take()
    }

    /// Copy out the elements of an array.
    pub fn array_elements(&self, array: ObjectRef) -> Result<ArrayElements, HostError> {
        let state = self.lock();
        match &state.object(array)?.data {
            ObjectData::PrimitiveArray(elements) => Ok(ArrayElements::Primitive(elements.clone())),
            ObjectData::ObjectArray(elements) => Ok(ArrayElements::Objects(elements.clone())),
            _ => Err(HostError::invalid_operand(
                "array_elements",
                format!("{array} is not an array"),
            )),
        }
    }

    /// Read an instance field by name, searching the superclass chain.
    pub fn read(&self, obj: ObjectRef, field: &str) -> Result<Slot, HostError> {
        let state = self.lock();
        let ty = state.object(obj)?.ty;
        let field = state
            .field_by_name(ty, field)
            .ok_or_else(|| HostError::UnknownMember {
                name: field.to_string(),
            })?;
        state.read(obj, &field)
    }

    /// Write an instance field by name, searching the superclass chain.
    pub fn write(&self, obj: ObjectRef, field: &str, value: Slot) -> Result<(), HostError> {
        let mut state = self.lock();
        let ty = state.object(obj)?.ty;
        let field = state
            .field_by_name(ty, field)
            .ok_or_else(|| HostError::UnknownMember {
                name: field.to_string(),
            })?;
        state.write(obj, &field, value)
    }

    /// Free an object; later uses of `obj` fail with a stale reference.
    pub fn free(&self, obj: ObjectRef) -> bool {
        self.lock().heap.free(obj)
    }

    pub fn live_objects(&self) -> usize {
        self.lock().heap.live_count()
    }

    /// Number of types currently pinned by resolution.
    pub fn pinned_types(&self) -> usize {
        self.lock().pinned.values().sum()
    }

    // === Internals ===

    /// Type denoted by a class object.
    pub(crate) fn class_target(&self, class_object: ObjectRef) -> Result<TypeHandle, HostError> {
        match self.lock().object(class_object)?.data {
            ObjectData::Class(ty) => Ok(ty),
            _ => Err(HostError::invalid_operand(
                "class_target",
                format!("{class_object} is not a class object"),
            )),
        }
    }

    pub(crate) fn array_component(&self, ty: TypeHandle) -> Option<TypeHandle> {
        match self.lock().classes.get(&ty)?.kind {
            ClassKind::Array { component } => Some(component),
            _ => None,
        }
    }

    pub(crate) fn set_static(
        &self,
        owner: TypeHandle,
        field: &str,
        value: Slot,
    ) -> Result<(), HostError> {
        let mut state = self.lock();
        let address = state
            .class(owner)?
            .fields
            .iter()
            .find(|f| f.is_static() && f.name == field)
            .map(|f| f.address)
            .ok_or_else(|| HostError::UnknownMember {
                name: field.to_string(),
            })?;
        state.statics.insert(address, value);
        Ok(())
    }

    fn check_throwable(&self, obj: ObjectRef) -> Result<(), HostError> {
        let state = self.lock();
        let ty = state.object(obj)?.ty;
        if state.is_assignable(ty, TypeHandle::from_name(THROWABLE)) {
            Ok(())
        } else {
            Err(HostError::NotThrowable {
                type_name: state.name_of(ty).map(source_name).unwrap_or_default(),
            })
        }
    }

    fn pin(&self, ty: TypeHandle) -> TypeHandle {
        *self.lock().pinned.entry(ty).or_default() += 1;
        ty
    }

    fn body_at(&self, address: CallAddress) -> Result<MethodBody, HostError> {
        self.lock()
            .bodies
            .get(&address)
            .cloned()
            .ok_or_else(|| HostError::UnknownMember {
                name: format!("{:#x}", address.into_raw()),
            })
    }

    fn call_accessor(
        &self,
        accessor: AccessorId,
        receiver: Option<ObjectRef>,
        args: &[Slot],
    ) -> Result<ReturnValue, HostError> {
        let body = self.body_at(CallAddress::from_raw(accessor.into_raw()))?;
        body(self, receiver, args)
    }

    fn allocate_array(&self, component_name: &str, data: ObjectData) -> ObjectRef {
        let mut state = self.lock();
        let ty = state.handle_for(&array_name(component_name));
        state.heap.allocate(SimObject { ty, data })
    }
}

fn needs_receiver(operation: &'static str, member: &MemberDescriptor) -> HostError {
    HostError::invalid_operand(operation, format!("`{}` needs a receiver", member.name))
}

// ============================================================================
// HostRuntime
// ============================================================================

impl HostRuntime for SimRuntime {
    fn resolve_type(&self, name: &str) -> Option<TypeHandle> {
        let ty = self.lock().lookup(name)?;
        Some(self.pin(ty))
    }

    fn resolve_static_type_field(&self, owner: TypeHandle, field: &str) -> Option<TypeHandle> {
        let ty = {
            let state = self.lock();
            let field = state
                .classes
                .get(&owner)?
                .fields
                .iter()
                .find(|f| f.is_static() && f.name == field)?;
            match state.statics.get(&field.address)? {
                Slot::Reference(Some(obj)) => match state.heap.get(*obj)?.data {
                    ObjectData::Class(ty) => ty,
                    _ => return None,
                },
                _ => return None,
            }
        };
        Some(self.pin(ty))
    }

    fn resolve_accessor(
        &self,
        owner: TypeHandle,
        name: &str,
        signature: &str,
    ) -> Option<AccessorId> {
        let state = self.lock();
        state
            .chain(owner)
            .flat_map(|c| c.methods.iter())
            .find(|m| m.descriptor.name == name && m.signature == signature)
            .map(|m| AccessorId::from_raw(m.descriptor.address.into_raw()))
    }

    fn release_type(&self, ty: TypeHandle) {
        let mut state = self.lock();
        if let Some(count) = state.pinned.get_mut(&ty) {
            *count -= 1;
            if *count == 0 {
                state.pinned.remove(&ty);
            }
        }
    }

    fn runtime_type(&self, obj: ObjectRef) -> Result<TypeHandle, HostError> {
        Ok(self.lock().object(obj)?.ty)
    }

    fn is_assignable(&self, from: TypeHandle, to: TypeHandle) -> bool {
        self.lock().is_assignable(from, to)
    }

    fn component_type(&self, accessor: AccessorId, array_type: TypeHandle) -> Option<TypeHandle> {
        let class_object = self.class_object(array_type);
        match self.call_accessor(accessor, Some(class_object), &[]).ok()? {
            ReturnValue::Reference(Some(component)) => {
                match self.lock().object(component).ok()?.data {
                    ObjectData::Class(ty) => Some(ty),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn type_name(&self, ty: TypeHandle) -> String {
        self.lock()
            .name_of(ty)
            .map(source_name)
            .unwrap_or_else(|| format!("{ty:?}"))
    }

    fn unbox(&self, accessor: AccessorId, obj: ObjectRef) -> Result<PrimitiveValue, HostError> {
        match self.call_accessor(accessor, Some(obj), &[])? {
            ReturnValue::Primitive(value) => Ok(value),
            other => Err(HostError::invalid_operand(
                "unbox",
                format!("accessor returned {other:?}"),
            )),
        }
    }

    fn box_value(
        &self,
        accessor: AccessorId,
        value: PrimitiveValue,
    ) -> Result<ObjectRef, HostError> {
        match self.call_accessor(accessor, None, &[Slot::Primitive(value)])? {
            ReturnValue::Reference(Some(obj)) => Ok(obj),
            other => Err(HostError::invalid_operand(
                "box",
                format!("accessor returned {other:?}"),
            )),
        }
    }

    fn new_primitive_array(&self, elements: PrimitiveArray) -> Result<ObjectRef, HostError> {
        let component = elements.kind().name();
        let data = ObjectData::PrimitiveArray(elements);
        Ok(self.allocate_array(component, data))
    }

    fn new_object_array(
        &self,
        component: TypeHandle,
        elements: &[Option<ObjectRef>],
    ) -> Result<ObjectRef, HostError> {
        let name = self
            .lock()
            .name_of(component)
            .map(str::to_string)
            .ok_or(HostError::UnknownType(component))?;
        let data = ObjectData::ObjectArray(elements.to_vec());
        Ok(self.allocate_array(&name, data))
    }
}

// ============================================================================
// HostAccess
// ============================================================================

impl HostAccess for SimRuntime {
    fn find_class(&self, internal_name: &str) -> Option<TypeHandle> {
        self.lock().lookup(internal_name)
    }

    fn allocate_instance(&self, ty: TypeHandle) -> Result<ObjectRef, HostError> {
        let mut state = self.lock();
        let class = state.class(ty)?;
        if !class.is_instantiable() {
            return Err(HostError::NotInstantiable {
                type_name: source_name(&class.name),
            });
        }
        let fields = state.instance_fields(ty);
        Ok(state.heap.allocate(SimObject {
            ty,
            data: ObjectData::Instance(fields),
        }))
    }

    fn release_instance(&self, obj: ObjectRef) -> bool {
        self.free(obj)
    }

    fn throw(&self, throwable: ObjectRef) -> Result<(), HostError> {
        self.check_throwable(throwable)?;
        self.lock().pending = Some(throwable);
        Ok(())
    }

    fn get_field(
        &self,
        receiver: Option<ObjectRef>,
        field: &MemberDescriptor,
    ) -> Result<Slot, HostError> {
        let state = self.lock();
        if field.is_static() {
            return state
                .statics
                .get(&field.address)
                .copied()
                .ok_or_else(|| HostError::UnknownMember {
                    name: field.name.clone(),
                });
        }
        let obj = receiver.ok_or_else(|| needs_receiver("get_field", field))?;
        state.read(obj, field)
    }

    fn set_field(
        &self,
        receiver: Option<ObjectRef>,
        field: &MemberDescriptor,
        value: Slot,
    ) -> Result<(), HostError> {
        let mut state = self.lock();
        if field.is_static() {
            return match state.statics.get_mut(&field.address) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(HostError::UnknownMember {
                    name: field.name.clone(),
                }),
            };
        }
        let obj = receiver.ok_or_else(|| needs_receiver("set_field", field))?;
        state.write(obj, field, value)
    }

    fn invoke(
        &self,
        receiver: Option<ObjectRef>,
        method: &MemberDescriptor,
        args: &TypedArgumentBuffer,
    ) -> Result<ReturnValue, HostError> {
        let body = {
            let state = self.lock();
            match method.kind {
                MemberKind::Field => {
                    return Err(HostError::invalid_operand(
                        "invoke",
                        format!("`{}` is a field", method.name),
                    ));
                }
                MemberKind::Method if !method.is_static() => {
                    let obj = receiver.ok_or_else(|| needs_receiver("invoke", method))?;
                    let ty = state.object(obj)?.ty;
                    state.dispatch(ty, method)
                }
                MemberKind::Constructor => {
                    let obj = receiver.ok_or_else(|| needs_receiver("invoke", method))?;
                    state.object(obj)?;
                    state.bodies.get(&method.address).cloned()
                }
                MemberKind::Method => state.bodies.get(&method.address).cloned(),
            }
        };
        let body = body.ok_or_else(|| {
            HostError::other(format!("`{}` has no implementation", method.name))
        })?;
        let receiver = if method.is_static() { None } else { receiver };
        body(self, receiver, args.as_slice())
    }

    fn declared_methods(&self, ty: TypeHandle) -> Result<Vec<MemberDescriptor>, HostError> {
        let state = self.lock();
        Ok(state
            .class(ty)?
            .methods
            .iter()
            .map(|m| m.descriptor.clone())
            .collect())
    }

    fn declared_constructors(&self, ty: TypeHandle) -> Result<Vec<MemberDescriptor>, HostError> {
        let state = self.lock();
        Ok(state
            .class(ty)?
            .constructors
            .iter()
            .map(|m| m.descriptor.clone())
            .collect())
    }

    fn declared_fields(&self, ty: TypeHandle) -> Result<Vec<MemberDescriptor>, HostError> {
        Ok(self.lock().class(ty)?.fields.clone())
    }

    fn superclass(&self, ty: TypeHandle) -> Option<TypeHandle> {
        self.lock().classes.get(&ty)?.superclass
    }

    fn interfaces(&self, ty: TypeHandle) -> Vec<TypeHandle> {
        self.lock()
            .classes
            .get(&ty)
            .map(|c| c.interfaces.clone())
            .unwrap_or_default()
    }

    fn is_interface(&self, ty: TypeHandle) -> bool {
        self.lock()
            .classes
            .get(&ty)
            .is_some_and(|c| c.kind == ClassKind::Interface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(rt: &SimRuntime, name: &str) -> TypeHandle {
        rt.find_class(name).unwrap()
    }

    #[test]
    fn well_known_classes_exist() {
        let rt = SimRuntime::new();
        for name in [
            OBJECT,
            CLASS,
            STRING,
            THROWABLE,
            "java/lang/Integer",
            "java/lang/Character",
            "java/lang/Void",
            "java/lang/Number",
            "java/lang/Comparable",
            "java/lang/CharSequence",
        ] {
            assert!(rt.find_class(name).is_some(), "{name}");
        }
        assert!(rt.find_class("no/such/Type").is_none());
    }

    #[test]
    fn arrays_created_on_demand() {
        let rt = SimRuntime::new();
        let strings = rt.find_class("[[Ljava/lang/String;").unwrap();
        assert!(rt.find_class("[Lno/such/Type;").is_none());
        assert_eq!(rt.type_name(strings), "java.lang.String[][]");
        assert_eq!(rt.superclass(strings), Some(ty(&rt, OBJECT)));
        assert_eq!(rt.type_name(ty(&rt, "[I")), "int[]");
    }

    #[test]
    fn assignability() {
        let rt = SimRuntime::new();
        let object = ty(&rt, OBJECT);
        let string = ty(&rt, STRING);
        let integer = ty(&rt, "java/lang/Integer");
        let number = ty(&rt, "java/lang/Number");
        let int = ty(&rt, "int");

        assert!(rt.is_assignable(string, object));
        assert!(rt.is_assignable(string, ty(&rt, "java/lang/CharSequence")));
        assert!(rt.is_assignable(integer, number));
        assert!(!rt.is_assignable(number, integer));
        assert!(!rt.is_assignable(int, object));
        assert!(!rt.is_assignable(integer, string));

        let strings = ty(&rt, "[Ljava/lang/String;");
        let objects = ty(&rt, "[Ljava/lang/Object;");
        let ints = ty(&rt, "[I");
        assert!(rt.is_assignable(strings, objects));
        assert!(rt.is_assignable(ints, object));
        assert!(!rt.is_assignable(ints, ty(&rt, "[J")));
        assert!(!rt.is_assignable(ints, objects));
    }

    #[test]
    fn strings_and_boxes() {
        let rt = SimRuntime::new();
        let s = rt.new_string("héllo").unwrap();
        assert_eq!(rt.string_value(s).unwrap(), "héllo");
        assert_eq!(rt.runtime_type(s).unwrap(), ty(&rt, STRING));

        let b = rt.new_boxed(2.5f64).unwrap();
        assert_eq!(rt.unboxed(b).unwrap(), PrimitiveValue::Double(2.5));
        let double = rt.runtime_type(b).unwrap();
        assert_eq!(rt.type_name(double), "java.lang.Double");
    }

    #[test]
    fn define_and_allocate() {
        let rt = SimRuntime::new();
        let point = rt
            .define(
                ClassBuilder::new("geo.Point")
                    .field("x", "int", Modifiers::PRIVATE)
                    .field("label", "java.lang.String", Modifiers::PRIVATE)
                    .field("COUNT", "long", Modifiers::STATIC),
            )
            .unwrap();
        let p = rt.allocate_instance(point).unwrap();
        let zero = Slot::Primitive(PrimitiveValue::Int(0));
        assert_eq!(rt.read(p, "x").unwrap(), zero);
        assert_eq!(rt.read(p, "label").unwrap(), Slot::Reference(None));

        let count = rt
            .declared_fields(point)
            .unwrap()
            .into_iter()
            .find(|f| f.name == "COUNT")
            .unwrap();
        assert_eq!(
            rt.get_field(None, &count).unwrap(),
            Slot::Primitive(PrimitiveValue::Long(0))
        );

        assert!(rt.define(ClassBuilder::new("geo.Point")).is_err());
    }

    #[test]
    fn default_constructor_added() {
        let rt = SimRuntime::new();
        let c = rt.define(ClassBuilder::new("a.C")).unwrap();
        let ctors = rt.declared_constructors(c).unwrap();
        assert_eq!(ctors.len(), 1);
        assert_eq!(ctors[0].arity(), 0);

        let i = rt.define(ClassBuilder::new("a.I").interface()).unwrap();
        assert!(rt.declared_constructors(i).unwrap().is_empty());
        assert!(rt.is_interface(i));
    }

    #[test]
    fn abstract_types_not_instantiable() {
        let rt = SimRuntime::new();
        let number = ty(&rt, "java/lang/Number");
        assert!(matches!(
            rt.allocate_instance(number),
            Err(HostError::NotInstantiable { .. })
        ));
        assert!(rt.allocate_instance(ty(&rt, "int")).is_err());
    }

    #[test]
    fn virtual_dispatch_picks_override() {
        let rt = SimRuntime::new();
        rt.define(ClassBuilder::new("zoo.Animal").method(
            "sound",
            &[],
            "int",
            Modifiers::PUBLIC,
            |_, _, _| Ok(ReturnValue::Primitive(PrimitiveValue::Int(1))),
        ))
        .unwrap();
        let dog = rt
            .define(ClassBuilder::new("zoo.Dog").extends("zoo.Animal").method(
                "sound",
                &[],
                "int",
                Modifiers::PUBLIC,
                |_, _, _| Ok(ReturnValue::Primitive(PrimitiveValue::Int(2))),
            ))
            .unwrap();
        let animal = ty(&rt, "zoo/Animal");
        let sound = rt.declared_methods(animal).unwrap().remove(0);

        let d = rt.allocate_instance(dog).unwrap();
        let none = TypedArgumentBuffer::new();
        let result = rt.invoke(Some(d), &sound, &none).unwrap();
        assert_eq!(result.as_primitive::<i32>(), Some(2));
    }

    #[test]
    fn resolution_pins_and_releases() {
        let rt = SimRuntime::new();
        let integer = rt.resolve_type("java/lang/Integer").unwrap();
        let int = rt.resolve_static_type_field(integer, "TYPE").unwrap();
        assert_eq!(int, ty(&rt, "int"));
        assert_eq!(rt.pinned_types(), 2);
        rt.release_type(int);
        rt.release_type(integer);
        assert_eq!(rt.pinned_types(), 0);
        assert!(rt.resolve_static_type_field(integer, "MISSING").is_none());
    }

    #[test]
    fn accessors_resolve_by_signature() {
        let rt = SimRuntime::new();
        let integer = ty(&rt, "java/lang/Integer");
        let unbox = rt.resolve_accessor(integer, "intValue", "()I").unwrap();
        let boxer = rt
            .resolve_accessor(integer, "valueOf", "(I)Ljava/lang/Integer;")
            .unwrap();
        assert!(rt.resolve_accessor(integer, "intValue", "()J").is_none());

        let obj = rt.box_value(boxer, PrimitiveValue::Int(41)).unwrap();
        assert_eq!(rt.unbox(unbox, obj).unwrap(), PrimitiveValue::Int(41));

        let class = ty(&rt, CLASS);
        let component = rt
            .resolve_accessor(class, "getComponentType", "()Ljava/lang/Class;")
            .unwrap();
        assert_eq!(
            rt.component_type(component, ty(&rt, "[Ljava/lang/String;")),
            Some(ty(&rt, STRING))
        );
        assert_eq!(rt.component_type(component, ty(&rt, STRING)), None);
    }

    #[test]
    fn throw_requires_throwable() {
        let rt = SimRuntime::new();
        let s = rt.new_string("not an exception").unwrap();
        assert!(matches!(rt.throw(s), Err(HostError::NotThrowable { .. })));

        let e = rt
            .new_throwable("java.lang.RuntimeException", "boom")
            .unwrap();
        rt.throw(e).unwrap();
        assert_eq!(rt.pending_throwable(), Some(e));
        assert_eq!(rt.pending_throwable(), None);
        assert_eq!(rt.raise(e), HostError::Thrown(e));
    }

    #[test]
    fn stale_references_detected() {
        let rt = SimRuntime::new();
        let s = rt.new_string("x").unwrap();
        assert!(rt.free(s));
        assert_eq!(rt.runtime_type(s), Err(HostError::StaleReference(s)));
    }

    #[test]
    fn arrays_copy_out() {
        let rt = SimRuntime::new();
        let ints = rt
            .new_primitive_array(PrimitiveArray::Int(vec![1, 2, 3]))
            .unwrap();
        assert_eq!(rt.type_name(rt.runtime_type(ints).unwrap()), "int[]");
        assert_eq!(
            rt.array_elements(ints).unwrap(),
            ArrayElements::Primitive(PrimitiveArray::Int(vec![1, 2, 3]))
        );

        let s = rt.new_string("a").unwrap();
        let string = ty(&rt, STRING);
        let objects = rt.new_object_array(string, &[Some(s), None]).unwrap();
        assert_eq!(
            rt.array_elements(objects).unwrap(),
            ArrayElements::Objects(vec![Some(s), None])
        );
        assert!(rt.array_elements(s).is_err());
    }

    #[test]
    fn bodies_can_reenter_runtime() {
        let rt = SimRuntime::new();
        let greeter = rt
            .define(ClassBuilder::new("a.Greeter").method(
                "greet",
                &["java.lang.String"],
                "java.lang.String",
                Modifiers::STATIC,
                |rt, _, args| {
                    let name = crate::sim::arg_ref(args, 0)?
                        .map(|s| rt.string_value(s))
                        .transpose()?
                        .unwrap_or_default();
                    let greeting = rt.new_string(&format!("hi {name}"))?;
                    Ok(ReturnValue::Reference(Some(greeting)))
                },
            ))
            .unwrap();
        let greet = rt.declared_methods(greeter).unwrap().remove(0);
        let bob = rt.new_string("bob").unwrap();
        let args = TypedArgumentBuffer::from_slots(vec![Slot::Reference(Some(bob))]);
        let out = rt.invoke(None, &greet, &args).unwrap();
        let out = out.as_reference().flatten().unwrap();
        assert_eq!(rt.string_value(out).unwrap(), "hi bob");
    }
}
