/// A partial update applied to a bound context value in place.
///
/// Fields the patch does not mention are left untouched. Implement this on a
/// struct of `Option` fields for a statically checkable merge, or pass a
/// closure; every `FnOnce(&mut T)` is a patch.
pub trait ContextPatch<T> {
    fn apply_to(self, context: &mut T);
}

impl<T, F> ContextPatch<T> for F
where
    F: FnOnce(&mut T),
{
    fn apply_to(self, context: &mut T) {
        self(context)
    }
}
