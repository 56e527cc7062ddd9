use std::fmt;

// Value Types

/// The type tag of a value living in a stack slot.
#[derive(Copy, Debug, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum Type {
    /// The absence of a value.
    Nil,
    /// `true` or `false`.
    Boolean,
    /// A signed 64 bit integer.
    Integer,
    /// A 64 bit floating point number.
    Number,
    /// An immutable string.
    String,
    /// A string-keyed table.
    Table,
    /// A native closure.
    Function,
    /// Opaque host data, including receivers and bound callables.
    UserData,
    /// Any of the above. Never the tag of a live value; used in signatures
    /// for parameters and results that accept every value.
    Any,
}

impl Type {
    /// The name scripts see for this type.
    pub fn name(self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Boolean => "boolean",
            Self::Integer | Self::Number => "number",
            Self::String => "string",
            Self::Table => "table",
            Self::Function => "function",
            Self::UserData => "userdata",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The shape of a host callable, as seen from the stack.
#[derive(Copy, Debug, Clone, Eq, PartialEq, Hash)]
pub enum CallableKind {
    /// A free function: parameters start at stack position 1.
    FreeFunction,
    /// A method: position 1 holds the receiver, parameters start at 2.
    MemberFunction,
    /// A field accessor: position 1 holds the receiver, nothing else is read.
    MemberData,
}

impl CallableKind {
    /// Number of leading stack slots reserved for the receiver.
    pub const fn receiver_slots(self) -> i32 {
        match self {
            Self::FreeFunction => 0,
            Self::MemberFunction | Self::MemberData => 1,
        }
    }
}

/// The descriptor of a bound callable: its kind, parameter types,
/// result type and owner.
///
/// A `Signature` is derived from the callable's static type, there is
/// no need for a live callable to build one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    kind: CallableKind,
    params: Box<[Type]>,
    result: Option<Type>,
    owner: Option<&'static str>,
}

impl Signature {
    /// A free function signature.
    pub fn free<Params>(params: Params, result: Option<Type>) -> Self
    where
        Params: Into<Box<[Type]>>,
    {
        Self {
            kind: CallableKind::FreeFunction,
            params: params.into(),
            result,
            owner: None,
        }
    }

    /// A method signature on `owner`.
    pub fn member_function<Params>(
        owner: &'static str,
        params: Params,
        result: Option<Type>,
    ) -> Self
    where
        Params: Into<Box<[Type]>>,
    {
        Self {
            kind: CallableKind::MemberFunction,
            params: params.into(),
            result,
            owner: Some(owner),
        }
    }

    /// A field accessor signature on `owner`. Field accessors never take
    /// parameters and always produce a value.
    pub fn member_data(owner: &'static str, result: Type) -> Self {
        Self {
            kind: CallableKind::MemberData,
            params: Box::new([]),
            result: Some(result),
            owner: Some(owner),
        }
    }

    /// The callable kind.
    pub fn kind(&self) -> CallableKind {
        self.kind
    }

    /// Parameter types, in declaration order.
    pub fn params(&self) -> &[Type] {
        &self.params
    }

    /// The result type, `None` for callables returning nothing.
    pub fn result(&self) -> Option<Type> {
        self.result
    }

    /// The receiver type name for member kinds.
    pub fn owner(&self) -> Option<&'static str> {
        self.owner
    }

    /// Whether the callable produces no result slot.
    pub fn is_void(&self) -> bool {
        self.result.is_none()
    }

    /// The 1-based stack position of the first parameter.
    pub fn first_param_index(&self) -> i32 {
        self.kind.receiver_slots() + 1
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let params = self
            .params
            .iter()
            .map(|p| format!("{p:?}"))
            .collect::<Vec<_>>()
            .join(", ");
        let result = self
            .result
            .map_or_else(|| "()".to_string(), |r| format!("{r:?}"));
        match (self.kind, self.owner) {
            (CallableKind::MemberData, Some(owner)) => write!(f, "{owner}.field -> {result}"),
            (_, Some(owner)) if params.is_empty() => write!(f, "{owner}::fn(self) -> {result}"),
            (_, Some(owner)) => write!(f, "{owner}::fn(self, {params}) -> {result}"),
            (_, None) => write!(f, "fn({params}) -> {result}"),
        }
    }
}
