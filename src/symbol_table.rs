//! Scoped symbol tables used by the [compiler](crate::compiler).

use std::collections::HashMap;
use std::fmt;

use crate::parsing::Span;

/// Type of the value a symbol names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolType {
    /// A 32-bit signed integer.
    Int,
    /// A byte string of `len` characters.
    Str { len: u32 },
    /// A list of `len` 32-bit words.
    List { len: u32 },
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SymbolType::Int => write!(f, "int"),
            SymbolType::Str { len } => write!(f, "string[{}]", len),
            SymbolType::List { len } => write!(f, "list[{}]", len),
        }
    }
}

/// Where the storage of a symbol lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryArea {
    /// Statically allocated in the data image.
    GlobalData,
    /// Pushed on the stack when the declaring block runs.
    StackLocal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    /// Byte address in the data image.
    Absolute(u32),
    /// The `slot`th word pushed in stack frame `frame`.
    Frame { frame: u32, slot: u32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub ty: SymbolType,
    pub area: MemoryArea,
    pub location: Location,
    /// Size of the storage in bytes.
    pub size: u32,
    /// The initial value, if it was known at compile time.
    pub constant: Option<i32>,
    /// Span of the declaring statement.
    pub defined: Span,
}

impl Symbol {
    /// Byte address of a statically allocated symbol.
    pub fn address(&self) -> Option<u32> {
        match self.location {
            Location::Absolute(addr) => Some(addr),
            Location::Frame { .. } => None,
        }
    }
}

/// Symbols of a single scope. Names are unique within the table.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
    order: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    /// Adds a symbol to the table.
    ///
    /// # Errors
    /// Returns the span of the earlier declaration if the name is already taken.
    pub fn declare(&mut self, symbol: Symbol) -> Result<(), Span> {
        if let Some(existing) = self.symbols.get(&symbol.name) {
            return Err(existing.defined.clone());
        }

        self.order.push(symbol.name.clone());
        self.symbols.insert(symbol.name.clone(), symbol);

        Ok(())
    }

    pub fn get<S: AsRef<str>>(&self, name: S) -> Option<&Symbol> {
        self.symbols.get(name.as_ref())
    }

    /// Iterates the symbols in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.order.iter().filter_map(move |name| self.symbols.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Stack of nested scopes. The outermost scope is the global scope and is
/// never popped.
#[derive(Clone, Debug)]
pub struct ScopeStack {
    scopes: Vec<SymbolTable>,
}

impl Default for ScopeStack {
    fn default() -> ScopeStack {
        ScopeStack::new()
    }
}

impl ScopeStack {
    pub fn new() -> ScopeStack {
        ScopeStack {
            scopes: vec![SymbolTable::new()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(SymbolTable::new());
    }

    /// Drops the innermost scope and returns its symbols.
    /// The global scope stays in place.
    pub fn pop_scope(&mut self) -> Option<SymbolTable> {
        if self.scopes.len() > 1 {
            self.scopes.pop()
        } else {
            None
        }
    }

    pub fn is_global(&self) -> bool {
        self.scopes.len() == 1
    }

    /// Declares a symbol in the innermost scope.
    pub fn declare(&mut self, symbol: Symbol) -> Result<(), Span> {
        self.scopes
            .last_mut()
            .expect("scope stack always holds the global scope")
            .declare(symbol)
    }

    /// Finds the innermost visible symbol called `name`.
    pub fn lookup<S: AsRef<str>>(&self, name: S) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name.as_ref()))
    }

    pub fn into_globals(mut self) -> SymbolTable {
        self.scopes.swap_remove(0)
    }

    /// Suggests a visible name that is close to the misspelled `name`.
    pub fn suggest(&self, name: &str) -> Option<String> {
        let threshold = std::cmp::max(1, name.len() / 3);

        self.scopes
            .iter()
            .flat_map(|scope| scope.iter())
            .map(|symbol| (edit_distance::edit_distance(name, &symbol.name), &symbol.name))
            .filter(|(distance, _)| *distance <= threshold)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, name)| name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(name: &str, addr: u32, defined: Span) -> Symbol {
        Symbol {
            name: name.to_string(),
            ty: SymbolType::Int,
            area: MemoryArea::GlobalData,
            location: Location::Absolute(addr),
            size: 4,
            constant: None,
            defined,
        }
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        let mut scopes = ScopeStack::new();

        scopes.declare(int("a", 0, 0..5)).unwrap();
        assert_eq!(scopes.declare(int("a", 4, 10..15)), Err(0..5));
        assert_eq!(scopes.lookup("a").and_then(Symbol::address), Some(0));
    }

    #[test]
    fn test_shadowing() {
        let mut scopes = ScopeStack::new();
        scopes.declare(int("a", 0, 0..1)).unwrap();

        scopes.push_scope();
        scopes.declare(int("a", 8, 2..3)).unwrap();
        assert_eq!(scopes.lookup("a").and_then(Symbol::address), Some(8));
        assert!(!scopes.is_global());

        let popped = scopes.pop_scope().unwrap();
        assert_eq!(popped.len(), 1);
        assert_eq!(scopes.lookup("a").and_then(Symbol::address), Some(0));
        assert!(scopes.pop_scope().is_none());
        assert!(scopes.is_global());
    }

    #[test]
    fn test_suggest() {
        let mut scopes = ScopeStack::new();
        scopes.declare(int("counter", 0, 0..1)).unwrap();
        scopes.declare(int("total", 4, 0..1)).unwrap();

        assert_eq!(scopes.suggest("countr"), Some("counter".to_string()));
        assert_eq!(scopes.suggest("xyz"), None);
    }

    #[test]
    fn test_declaration_order() {
        let mut table = SymbolTable::new();

        for (i, name) in ["z", "a", "m"].iter().enumerate() {
            table.declare(int(name, i as u32 * 4, 0..1)).unwrap();
        }

        let names = table.iter().map(|s| s.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["z", "a", "m"]);
    }
}
