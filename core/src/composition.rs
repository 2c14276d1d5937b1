//! Reducer composition utilities
//!
//! - **`combine_reducers`**: run several reducers over the same state/action, in order
//! - **`scope_reducer`**: focus a slice reducer on one field of a larger state
//! - **`with_effects`**: run an [`EffectHandler`] after a reducer for the same action
//!
//! A root reducer is usually all three at once: every slice reducer is scoped
//! onto its field of the snapshot, the scoped reducers are combined, and the
//! effect handler is attached last so effects observe the action after every
//! slice has seen it.
//!
//! # Examples
//!
//! ```
//! use shoptrack_core::{Reducer, Effect, SmallVec, smallvec};
//! use shoptrack_core::composition::{combine_reducers, scope_reducer};
//!
//! #[derive(Clone, Default)]
//! struct Shelf {
//!     count: u32,
//! }
//!
//! #[derive(Clone, Default)]
//! struct Warehouse {
//!     left: Shelf,
//!     right: Shelf,
//! }
//!
//! #[derive(Clone)]
//! enum Restock {
//!     Left,
//!     Right,
//! }
//!
//! struct LeftShelf;
//! struct RightShelf;
//!
//! impl Reducer for LeftShelf {
//!     type State = Shelf;
//!     type Action = Restock;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut Shelf, action: Restock, _env: &()) -> SmallVec<[Effect<Restock>; 4]> {
//!         if matches!(action, Restock::Left) {
//!             state.count += 1;
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! impl Reducer for RightShelf {
//!     type State = Shelf;
//!     type Action = Restock;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut Shelf, action: Restock, _env: &()) -> SmallVec<[Effect<Restock>; 4]> {
//!         if matches!(action, Restock::Right) {
//!             state.count += 1;
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let root = combine_reducers(vec![
//!     Box::new(scope_reducer(LeftShelf, |w: &mut Warehouse| &mut w.left)),
//!     Box::new(scope_reducer(RightShelf, |w: &mut Warehouse| &mut w.right)),
//! ]);
//!
//! let mut warehouse = Warehouse::default();
//! root.reduce(&mut warehouse, Restock::Right, &());
//! assert_eq!(warehouse.left.count, 0);
//! assert_eq!(warehouse.right.count, 1);
//! ```

use crate::effect::{Effect, EffectHandler};
use crate::reducer::Reducer;
use smallvec::SmallVec;

/// Boxed reducer over a shared state/action/environment triple.
pub type BoxedReducer<S, A, E> = Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

/// Combines reducers that operate on the same state and action types.
///
/// Each reducer runs in the given order and receives its own clone of the
/// action; effects are concatenated in the same order.
#[must_use]
pub fn combine_reducers<S, A, E>(reducers: Vec<BoxedReducer<S, A, E>>) -> CombinedReducer<S, A, E>
where
    A: Clone,
{
    CombinedReducer { reducers }
}

/// A reducer that runs several reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E> {
    reducers: Vec<BoxedReducer<S, A, E>>,
}

impl<S, A, E> CombinedReducer<S, A, E> {
    /// Number of reducers combined
    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// `true` if nothing was combined
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    A: Clone,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut all_effects = SmallVec::new();

        for reducer in &self.reducers {
            let effects = reducer.reduce(state, action.clone(), env);
            all_effects.extend(effects.into_iter().filter(|e: &Effect<A>| !e.is_none()));
        }

        all_effects
    }
}

/// Focuses a reducer on one part of a larger state.
///
/// `focus` borrows the sub-state mutably in place, so a slice reducer that
/// ignores an action leaves the slice exactly as it was (no clone, no write
/// back). Slices held behind an `Arc` therefore keep their identity.
pub fn scope_reducer<S, SubS, R>(reducer: R, focus: fn(&mut S) -> &mut SubS) -> ScopedReducer<S, SubS, R>
where
    R: Reducer<State = SubS>,
{
    ScopedReducer { reducer, focus }
}

/// A reducer that operates on a subset of state.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, SubS, R> {
    reducer: R,
    focus: fn(&mut S) -> &mut SubS,
}

impl<S, SubS, R> Reducer for ScopedReducer<S, SubS, R>
where
    R: Reducer<State = SubS>,
{
    type State = S;
    type Action = R::Action;
    type Environment = R::Environment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        self.reducer.reduce((self.focus)(state), action, env)
    }
}

/// Attaches an effect handler to a reducer.
///
/// The handler inspects the action before the reducer consumes it, but the
/// returned effect is only appended to the reducer's own effects, so the
/// runtime starts it after the new state has been published.
pub const fn with_effects<R, H>(reducer: R, handler: H) -> WithEffects<R, H> {
    WithEffects { reducer, handler }
}

/// A reducer followed by an effect handler.
///
/// Created by [`with_effects`].
pub struct WithEffects<R, H> {
    reducer: R,
    handler: H,
}

impl<R, H> WithEffects<R, H> {
    /// The wrapped reducer
    pub const fn reducer(&self) -> &R {
        &self.reducer
    }

    /// The wrapped effect handler
    pub const fn handler(&self) -> &H {
        &self.handler
    }
}

impl<R, H> Reducer for WithEffects<R, H>
where
    R: Reducer,
    H: EffectHandler<Action = R::Action, Environment = R::Environment>,
{
    type State = R::State;
    type Action = R::Action;
    type Environment = R::Environment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let effect = self.handler.handle(&action, env);
        let mut effects = self.reducer.reduce(state, action, env);
        if !effect.is_none() {
            effects.push(effect);
        }
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smallvec;
    use std::sync::Arc;

    #[derive(Clone, Default, Debug, PartialEq)]
    struct Basket {
        lines: Vec<String>,
    }

    #[derive(Clone, Default)]
    struct Checkout {
        basket: Arc<Basket>,
        coupon: Arc<Option<String>>,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum CheckoutAction {
        AddLine(String),
        ApplyCoupon(String),
        Refresh,
        Refreshed,
    }

    struct BasketReducer;

    impl Reducer for BasketReducer {
        type State = Arc<Basket>;
        type Action = CheckoutAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            if let CheckoutAction::AddLine(line) = action {
                Arc::make_mut(state).lines.push(line);
            }
            smallvec![Effect::None]
        }
    }

    struct CouponReducer;

    impl Reducer for CouponReducer {
        type State = Arc<Option<String>>;
        type Action = CheckoutAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            if let CheckoutAction::ApplyCoupon(code) = action {
                *state = Arc::new(Some(code));
            }
            SmallVec::new()
        }
    }

    struct RefreshEffects;

    impl EffectHandler for RefreshEffects {
        type Action = CheckoutAction;
        type Environment = ();

        fn handle(&self, action: &CheckoutAction, _env: &()) -> Effect<CheckoutAction> {
            match action {
                CheckoutAction::Refresh => Effect::future(async { Some(CheckoutAction::Refreshed) }),
                _ => Effect::None,
            }
        }
    }

    fn root() -> CombinedReducer<Checkout, CheckoutAction, ()> {
        combine_reducers(vec![
            Box::new(scope_reducer(BasketReducer, |c: &mut Checkout| &mut c.basket)),
            Box::new(scope_reducer(CouponReducer, |c: &mut Checkout| &mut c.coupon)),
        ])
    }

    #[test]
    fn test_combined_reducers_run_in_order() {
        let reducer = root();
        assert_eq!(reducer.len(), 2);

        let mut state = Checkout::default();
        let _ = reducer.reduce(&mut state, CheckoutAction::AddLine("eggs".into()), &());
        let _ = reducer.reduce(&mut state, CheckoutAction::AddLine("flour".into()), &());
        let _ = reducer.reduce(&mut state, CheckoutAction::ApplyCoupon("SPRING".into()), &());

        assert_eq!(state.basket.lines, vec!["eggs".to_string(), "flour".to_string()]);
        assert_eq!(*state.coupon, Some("SPRING".to_string()));
    }

    #[test]
    fn test_scoped_reducer_keeps_untouched_slice_identity() {
        let reducer = root();
        let before = Checkout::default();
        let mut after = before.clone();

        let _ = reducer.reduce(&mut after, CheckoutAction::AddLine("salt".into()), &());

        assert!(!Arc::ptr_eq(&before.basket, &after.basket));
        assert!(Arc::ptr_eq(&before.coupon, &after.coupon));
        // The previous snapshot still sees the old slice
        assert!(before.basket.lines.is_empty());
    }

    #[test]
    fn test_combined_reducer_drops_none_effects() {
        let reducer = root();
        let mut state = Checkout::default();
        let effects = reducer.reduce(&mut state, CheckoutAction::Refresh, &());
        assert!(effects.is_empty());
    }

    #[test]
    fn test_with_effects_appends_handler_effect() {
        let reducer = with_effects(root(), RefreshEffects);
        let mut state = Checkout::default();

        let effects = reducer.reduce(&mut state, CheckoutAction::Refresh, &());
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], Effect::Future(_)));

        let effects = reducer.reduce(&mut state, CheckoutAction::AddLine("oil".into()), &());
        assert!(effects.is_empty());
        assert_eq!(state.basket.lines.len(), 1);
    }
}
