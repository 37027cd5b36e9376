//! Heap instances of the value model.
//!
//! Objects, arrays, and function values carry reference identity through
//! their `Arc` allocation: two values are the *same* instance exactly when
//! their handles point at the same allocation. Field and element slots sit
//! behind an `RwLock` because the deep copier must register a freshly
//! allocated shell in the reference map *before* its children are copied,
//! then fill the slots afterwards; that is what makes child-to-parent
//! back-references resolve to the copy instead of recursing forever.

use std::sync::{Arc, RwLock};

use crate::metadata::token::TypeToken;
use crate::value::Value;

/// Reference to an [`ObjectInstance`]
pub type ObjectRc = Arc<ObjectInstance>;
/// Reference to an [`ArrayInstance`]
pub type ArrayRc = Arc<ArrayInstance>;
/// Reference to a [`FunctionInstance`]
pub type FunctionRc = Arc<FunctionInstance>;

/// One aggregate instance: a concrete runtime type plus one slot per
/// inherited instance field, ordered base-classes-first to match the
/// introspector's field ordering.
pub struct ObjectInstance {
    /// Token of the concrete runtime type
    runtime_type: TypeToken,
    /// Field slots, parallel to the introspector's inherited field order
    slots: RwLock<Vec<Value>>,
}

impl ObjectInstance {
    /// Allocate an instance with every slot set to null
    #[must_use]
    pub fn new(runtime_type: TypeToken, slot_count: usize) -> ObjectRc {
        Arc::new(ObjectInstance {
            runtime_type,
            slots: RwLock::new(vec![Value::Null; slot_count]),
        })
    }

    /// Allocate an instance with the given slot values
    #[must_use]
    pub fn with_slots(runtime_type: TypeToken, slots: Vec<Value>) -> ObjectRc {
        Arc::new(ObjectInstance {
            runtime_type,
            slots: RwLock::new(slots),
        })
    }

    /// Token of the concrete runtime type
    #[must_use]
    pub fn runtime_type(&self) -> TypeToken {
        self.runtime_type
    }

    /// Number of field slots
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.read().map(|slots| slots.len()).unwrap_or(0)
    }

    /// Read the value of one field slot
    #[must_use]
    pub fn get(&self, index: usize) -> Value {
        self.slots
            .read()
            .ok()
            .and_then(|slots| slots.get(index).cloned())
            .unwrap_or(Value::Null)
    }

    /// Write the value of one field slot. Writes past the slot count are
    /// ignored; the walkers only address slots they counted themselves.
    pub fn set(&self, index: usize, value: Value) {
        if let Ok(mut slots) = self.slots.write() {
            if let Some(slot) = slots.get_mut(index) {
                *slot = value;
            }
        }
    }
}

impl std::fmt::Debug for ObjectInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ObjectInstance({}, {} slots)",
            self.runtime_type,
            self.slot_count()
        )
    }
}

/// One array instance: element type, array type, and the element slots
pub struct ArrayInstance {
    /// Token of the array type itself
    array_type: TypeToken,
    /// Token of the element type
    element_type: TypeToken,
    /// Element slots
    elements: RwLock<Vec<Value>>,
}

impl ArrayInstance {
    /// Allocate an array with every element set to null
    #[must_use]
    pub fn new(array_type: TypeToken, element_type: TypeToken, length: usize) -> ArrayRc {
        Arc::new(ArrayInstance {
            array_type,
            element_type,
            elements: RwLock::new(vec![Value::Null; length]),
        })
    }

    /// Allocate an array with the given elements
    #[must_use]
    pub fn with_elements(
        array_type: TypeToken,
        element_type: TypeToken,
        elements: Vec<Value>,
    ) -> ArrayRc {
        Arc::new(ArrayInstance {
            array_type,
            element_type,
            elements: RwLock::new(elements),
        })
    }

    /// Token of the array type
    #[must_use]
    pub fn array_type(&self) -> TypeToken {
        self.array_type
    }

    /// Token of the element type
    #[must_use]
    pub fn element_type(&self) -> TypeToken {
        self.element_type
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Returns true if the array holds no elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read one element
    #[must_use]
    pub fn get(&self, index: usize) -> Value {
        self.elements
            .read()
            .ok()
            .and_then(|e| e.get(index).cloned())
            .unwrap_or(Value::Null)
    }

    /// Write one element
    pub fn set(&self, index: usize, value: Value) {
        if let Ok(mut elements) = self.elements.write() {
            if let Some(slot) = elements.get_mut(index) {
                *slot = value;
            }
        }
    }

    /// Snapshot the elements into a vector
    #[must_use]
    pub fn snapshot(&self) -> Vec<Value> {
        self.elements
            .read()
            .map(|e| e.clone())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for ArrayInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ArrayInstance({}, len {})", self.array_type, self.len())
    }
}

/// One function value: the declared delegate/closure type plus the captured
/// environment. The capture participates in deep copy (a copied delegate is
/// reconstructed around a copied capture) and makes function values mutable
/// by construction.
pub struct FunctionInstance {
    /// Token of the function type
    function_type: TypeToken,
    /// Captured environment
    capture: RwLock<Value>,
}

impl FunctionInstance {
    /// Allocate a function value with the given capture
    #[must_use]
    pub fn new(function_type: TypeToken, capture: Value) -> FunctionRc {
        Arc::new(FunctionInstance {
            function_type,
            capture: RwLock::new(capture),
        })
    }

    /// Token of the function type
    #[must_use]
    pub fn function_type(&self) -> TypeToken {
        self.function_type
    }

    /// Snapshot the captured environment
    #[must_use]
    pub fn capture(&self) -> Value {
        self.capture
            .read()
            .map(|c| c.clone())
            .unwrap_or(Value::Null)
    }

    /// Replace the captured environment
    pub fn set_capture(&self, value: Value) {
        if let Ok(mut capture) = self.capture.write() {
            *capture = value;
        }
    }
}

impl std::fmt::Debug for FunctionInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FunctionInstance({})", self.function_type)
    }
}
