use super::object::ObjectHandle;

/// Identifier resolution chain, innermost scope first, the global object last
#[derive(Debug, Clone)]
pub struct ScopeChain {
    /// Outermost (global) first
    scopes: Vec<ObjectHandle>,
}

impl ScopeChain {
    pub fn new(global: ObjectHandle) -> Self {
        Self { scopes: vec![global] }
    }

    pub fn global(&self) -> &ObjectHandle {
        &self.scopes[0]
    }

    pub fn push(&mut self, scope: ObjectHandle) {
        self.scopes.push(scope);
    }

    /// Pop the innermost scope; the global scope is never popped
    pub fn pop(&mut self) -> Option<ObjectHandle> {
        if self.scopes.len() > 1 {
            self.scopes.pop()
        } else {
            None
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Scopes in lookup order
    pub fn innermost_first(&self) -> Vec<ObjectHandle> {
        self.scopes.iter().rev().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_cannot_be_popped() {
        let global = ObjectHandle::plain(None);
        let mut chain = ScopeChain::new(global.clone());
        chain.push(ObjectHandle::plain(None));
        assert!(chain.pop().is_some());
        assert!(chain.pop().is_none());
        assert!(chain.global().ptr_eq(&global));
        assert_eq!(chain.innermost_first().len(), 1);
    }
}
