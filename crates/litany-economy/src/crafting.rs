//! Crafting: turning a token selection (or a recipe name) into an effect.
//!
//! # Check order
//!
//! 1. The selection holds 1 to `max_selection` distinct tokens.
//! 2. The first unlocked recipe, in book order, whose inputs the selection
//!    covers is chosen. Later recipes are never tried, even if the chosen
//!    one fails a later check.
//! 3. Cooldown, requirements, memory-slot capacity, Intone charge lock and
//!    affordability of the cast cost are checked in that order.
//!
//! Any failure leaves every pool, timer and skill untouched. On success the
//! cast cost is debited (unused selected tokens are simply discarded), then
//! the recipe either credits its outputs, starts a buff, or adds an Intone
//! charge. The cooldown starts and XP is granted.

use std::collections::{BTreeMap, BTreeSet};

use litany_types::{CraftOutcome, Rejection, Resource, SkillTag, Token};
use tracing::debug;

use crate::effects::EffectScheduler;
use crate::intone::IntoneCharge;
use crate::pool::{Amounts, Pools};
use crate::recipes::{Recipe, RecipeBook};
use crate::skills::SkillSet;

/// Default cap on selected tokens.
pub const MAX_SELECTION: usize = 3;

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Tokens the player has picked for the next craft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    tokens: Vec<Token>,
    max: usize,
}

impl Selection {
    /// An empty selection holding at most `max` tokens.
    pub const fn new(max: usize) -> Self {
        Self {
            tokens: Vec::new(),
            max,
        }
    }

    /// Select `token`, or deselect it if already selected.
    ///
    /// Returns whether the token is selected afterwards. A full selection
    /// ignores new tokens.
    pub fn toggle(&mut self, token: Token) -> bool {
        if let Some(index) = self.tokens.iter().position(|t| *t == token) {
            self.tokens.remove(index);
            return false;
        }
        if self.tokens.len() >= self.max {
            return false;
        }
        self.tokens.push(token);
        true
    }

    /// Selected tokens in pick order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Capacity.
    pub const fn max(&self) -> usize {
        self.max
    }

    /// Number of selected tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Drop every token.
    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    /// Take the tokens out, leaving the selection empty.
    pub fn take(&mut self) -> Vec<Token> {
        std::mem::take(&mut self.tokens)
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(MAX_SELECTION)
    }
}

// ---------------------------------------------------------------------------
// Workshop
// ---------------------------------------------------------------------------

/// Mutable state a craft touches.
#[derive(Debug)]
pub struct Workshop<'a> {
    /// Resource pools.
    pub pools: &'a mut Pools,
    /// Player skills.
    pub skills: &'a mut SkillSet,
    /// Buffs and cooldowns.
    pub effects: &'a mut EffectScheduler,
    /// The Intone charge machine.
    pub intone: &'a mut IntoneCharge,
    /// Memory Palace level, for slot capacity.
    pub palace_level: u32,
}

/// What a successful craft did.
#[derive(Debug, Clone, PartialEq)]
pub struct CraftReport {
    /// The recipe applied.
    pub recipe: String,
    /// Skills that levelled up, with their new level.
    pub level_ups: Vec<(SkillTag, u32)>,
    /// Whether a new buff started.
    pub buff_started: bool,
    /// Outputs actually credited (single-cast recipes).
    pub credited: Amounts,
}

impl CraftReport {
    /// The outcome shown to the player.
    pub fn outcome(&self) -> CraftOutcome {
        CraftOutcome::applied(self.recipe.clone())
    }
}

/// Why a craft failed, and which recipe it resolved to, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct CraftFailure {
    /// The resolved recipe.
    pub recipe: Option<String>,
    /// The reason.
    pub rejection: Rejection,
}

impl CraftFailure {
    const fn unresolved(rejection: Rejection) -> Self {
        Self {
            recipe: None,
            rejection,
        }
    }

    fn for_recipe(recipe: &Recipe, rejection: Rejection) -> Self {
        Self {
            recipe: Some(recipe.name.clone()),
            rejection,
        }
    }

    /// The outcome shown to the player.
    pub fn outcome(&self) -> CraftOutcome {
        match &self.recipe {
            Some(recipe) => CraftOutcome::rejected_for(recipe.clone(), self.rejection.clone()),
            None => CraftOutcome::rejected(self.rejection.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Check a selection and count its tokens per resource.
pub fn validate_selection(
    tokens: &[Token],
    max_selection: usize,
) -> Result<BTreeMap<Resource, u32>, Rejection> {
    if tokens.is_empty() {
        return Err(Rejection::selection("select at least one resource"));
    }
    if tokens.len() > max_selection {
        return Err(Rejection::selection(format!(
            "select at most {max_selection} resources"
        )));
    }
    let distinct: BTreeSet<&Token> = tokens.iter().collect();
    if distinct.len() != tokens.len() {
        return Err(Rejection::selection("the same token was selected twice"));
    }
    let mut counts = BTreeMap::new();
    for token in tokens {
        let count: &mut u32 = counts.entry(token.resource).or_insert(0);
        *count = count.saturating_add(1);
    }
    Ok(counts)
}

/// Resolve a selection to a recipe without applying it.
pub fn find_match<'b>(
    book: &'b RecipeBook,
    tokens: &[Token],
    max_selection: usize,
) -> Result<&'b Recipe, Rejection> {
    let counts = validate_selection(tokens, max_selection)?;
    book.first_match(&counts)
        .ok_or(Rejection::NoMatchingRecipe)
}

/// Craft from a token selection.
pub fn attempt_craft(
    book: &RecipeBook,
    workshop: &mut Workshop<'_>,
    tokens: &[Token],
    max_selection: usize,
) -> Result<CraftReport, CraftFailure> {
    let recipe = find_match(book, tokens, max_selection).map_err(CraftFailure::unresolved)?;
    apply_recipe(recipe, workshop)
}

/// Cast a recipe by name, skipping selection matching.
pub fn cast_recipe(
    book: &RecipeBook,
    workshop: &mut Workshop<'_>,
    name: &str,
) -> Result<CraftReport, CraftFailure> {
    let recipe = book.get(name).ok_or_else(|| {
        CraftFailure::unresolved(Rejection::UnknownRecipe {
            recipe: name.to_owned(),
        })
    })?;
    if !recipe.is_unlocked() {
        return Err(CraftFailure::for_recipe(
            recipe,
            Rejection::RecipeLocked {
                recipe: recipe.name.clone(),
            },
        ));
    }
    apply_recipe(recipe, workshop)
}

/// Every check that can refuse `recipe`, in order. Mutates nothing.
pub fn check_recipe(recipe: &Recipe, workshop: &Workshop<'_>) -> Result<Amounts, Rejection> {
    workshop.effects.check_cooldown(&recipe.name)?;
    if let Some(requirements) = &recipe.requirements {
        requirements
            .check(&*workshop.pools, &*workshop.skills)
            .map_err(Rejection::requirement)?;
    }
    if recipe.occupies_slot() {
        workshop
            .effects
            .ensure_capacity(recipe, workshop.palace_level)?;
    }
    if recipe.charge {
        workshop.intone.can_charge()?;
    }
    let cost = recipe.cost();
    workshop.pools.check_affordable(&cost)?;
    Ok(cost)
}

fn apply_recipe(recipe: &Recipe, workshop: &mut Workshop<'_>) -> Result<CraftReport, CraftFailure> {
    let fail = |rejection| CraftFailure::for_recipe(recipe, rejection);
    let cost = check_recipe(recipe, workshop).map_err(fail)?;
    workshop.pools.pay(&cost).map_err(fail)?;

    let mut buff_started = false;
    let mut credited = Amounts::new();
    if recipe.charge {
        workshop.intone.invoke().map_err(fail)?;
    } else if recipe.is_sustained() {
        buff_started = workshop.effects.activate(recipe);
    } else {
        credited = workshop.pools.credit_all(&recipe.scaled_outputs(1.0));
    }
    workshop.effects.start_cooldown(recipe);

    let mut level_ups = Vec::new();
    for (skill, share) in recipe.xp_shares() {
        if let Some(level) = workshop.skills.grant(skill, share) {
            level_ups.push((skill, level));
        }
    }

    debug!(recipe = %recipe.name, buff_started, "Recipe applied");
    Ok(CraftReport {
        recipe: recipe.name.clone(),
        level_ups,
        buff_started,
        credited,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pool::ResourcePool;
    use crate::recipes::Requirements;
    use litany_types::RecipeTag;

    struct Bench {
        pools: Pools,
        skills: SkillSet,
        effects: EffectScheduler,
        intone: IntoneCharge,
    }

    impl Bench {
        fn new(amounts: &[(Resource, f64)]) -> Self {
            let pools = Pools::from_map(
                amounts
                    .iter()
                    .map(|(r, a)| (*r, ResourcePool::with_current(*a, 1000.0, true).unwrap()))
                    .collect(),
            );
            Self {
                pools,
                skills: SkillSet::new(),
                effects: EffectScheduler::default(),
                intone: IntoneCharge::default(),
            }
        }

        fn workshop(&mut self) -> Workshop<'_> {
            Workshop {
                pools: &mut self.pools,
                skills: &mut self.skills,
                effects: &mut self.effects,
                intone: &mut self.intone,
                palace_level: 0,
            }
        }
    }

    fn tok(resource: Resource, index: u32) -> Token {
        Token::new(resource, index)
    }

    #[test]
    fn selection_size_is_validated() {
        assert!(matches!(
            validate_selection(&[], 3),
            Err(Rejection::InvalidSelection { .. })
        ));
        let four = [
            tok(Resource::Insight, 0),
            tok(Resource::Insight, 1),
            tok(Resource::Insight, 2),
            tok(Resource::Insight, 3),
        ];
        assert!(validate_selection(&four, 3).is_err());
        let dup = [tok(Resource::Sound, 0), tok(Resource::Sound, 0)];
        assert!(validate_selection(&dup, 3).is_err());
    }

    #[test]
    fn counts_occurrences_per_resource() {
        let counts = validate_selection(
            &[tok(Resource::Insight, 0), tok(Resource::Insight, 1), tok(Resource::Sound, 0)],
            3,
        )
        .unwrap();
        assert_eq!(counts[&Resource::Insight], 2);
        assert_eq!(counts[&Resource::Sound], 1);
    }

    #[test]
    fn invalid_selection_mutates_nothing() {
        let book = RecipeBook::standard().unwrap();
        let mut bench = Bench::new(&[(Resource::Insight, 100.0)]);
        let before = bench.pools.clone();
        let failure = attempt_craft(&book, &mut bench.workshop(), &[], 3).unwrap_err();
        assert!(failure.recipe.is_none());
        assert_eq!(bench.pools, before);
    }

    #[test]
    fn murmur_turns_insight_into_sound() {
        let book = RecipeBook::standard().unwrap();
        let mut bench = Bench::new(&[(Resource::Insight, 100.0)]);
        let report =
            attempt_craft(&book, &mut bench.workshop(), &[tok(Resource::Insight, 0)], 3).unwrap();
        assert_eq!(report.recipe, "Murmur");
        assert!((bench.pools.current(Resource::Insight) - 85.0).abs() < 1e-9);
        assert!((bench.pools.current(Resource::Sound) - 1.0).abs() < 1e-9);
        assert!((bench.skills.get(SkillTag::Speech).xp() - 5.0).abs() < 1e-9);
        assert!(bench.effects.cooldown_remaining("Murmur").is_some());
    }

    #[test]
    fn sound_and_insight_make_thought() {
        let book = RecipeBook::new(vec![
            Recipe::new("Ponder")
                .inputs([(Resource::Sound, 1), (Resource::Insight, 1)])
                .outputs([(Resource::Thought, 1)]),
        ])
        .unwrap();
        let mut bench = Bench::new(&[
            (Resource::Sound, 5.0),
            (Resource::Insight, 5.0),
            (Resource::Thought, 0.0),
        ]);
        attempt_craft(
            &book,
            &mut bench.workshop(),
            &[tok(Resource::Sound, 0), tok(Resource::Insight, 0)],
            3,
        )
        .unwrap();
        assert!((bench.pools.current(Resource::Sound) - 4.0).abs() < 1e-9);
        assert!((bench.pools.current(Resource::Insight) - 4.0).abs() < 1e-9);
        assert!((bench.pools.current(Resource::Thought) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unused_tokens_are_discarded() {
        let book = RecipeBook::standard().unwrap();
        let mut bench = Bench::new(&[(Resource::Insight, 100.0), (Resource::Word, 3.0)]);
        // Murmur only uses insight; the word token is not refunded or spent.
        let report = attempt_craft(
            &book,
            &mut bench.workshop(),
            &[tok(Resource::Insight, 0), tok(Resource::Word, 0)],
            3,
        )
        .unwrap();
        assert_eq!(report.recipe, "Murmur");
        assert!((bench.pools.current(Resource::Word) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn cooldown_blocks_a_second_cast() {
        let book = RecipeBook::standard().unwrap();
        let mut bench = Bench::new(&[(Resource::Insight, 100.0)]);
        let sel = [tok(Resource::Insight, 0)];
        attempt_craft(&book, &mut bench.workshop(), &sel, 3).unwrap();
        let failure = attempt_craft(&book, &mut bench.workshop(), &sel, 3).unwrap_err();
        assert_eq!(failure.recipe.as_deref(), Some("Murmur"));
        assert!(matches!(failure.rejection, Rejection::OnCooldown { .. }));
        assert!((bench.pools.current(Resource::Insight) - 85.0).abs() < 1e-9);
    }

    #[test]
    fn first_match_does_not_fall_through() {
        // "Strict" matches first but fails its requirement; "Loose" also
        // matches and would succeed, yet must not be tried.
        let book = RecipeBook::new(vec![
            Recipe::new("Strict")
                .inputs([(Resource::Insight, 1)])
                .requires(Requirements::skill(SkillTag::Calling, 9)),
            Recipe::new("Loose")
                .inputs([(Resource::Insight, 1)])
                .outputs([(Resource::Sound, 1)]),
        ])
        .unwrap();
        let mut bench = Bench::new(&[(Resource::Insight, 10.0)]);
        let failure =
            attempt_craft(&book, &mut bench.workshop(), &[tok(Resource::Insight, 0)], 3)
                .unwrap_err();
        assert_eq!(failure.recipe.as_deref(), Some("Strict"));
        assert!(matches!(failure.rejection, Rejection::RequirementNotMet { .. }));
        assert!(bench.pools.current(Resource::Sound).abs() < 1e-9);
    }

    #[test]
    fn unaffordable_cast_is_rejected_without_mutation() {
        let book = RecipeBook::standard().unwrap();
        let mut bench = Bench::new(&[(Resource::Insight, 10.0)]);
        let failure =
            attempt_craft(&book, &mut bench.workshop(), &[tok(Resource::Insight, 0)], 3)
                .unwrap_err();
        assert!(failure.rejection.to_string().contains("not enough insight"));
        assert!((bench.pools.current(Resource::Insight) - 10.0).abs() < 1e-9);
        assert!(bench.effects.cooldowns().is_empty());
        assert!(bench.skills.get(SkillTag::Speech).xp().abs() < f64::EPSILON);
    }

    #[test]
    fn duration_recipe_starts_a_buff() {
        let mut book = RecipeBook::standard().unwrap();
        book.unlock("Resonance").unwrap();
        let mut bench = Bench::new(&[(Resource::Word, 2.0), (Resource::Sound, 5.0)]);
        let report = attempt_craft(
            &book,
            &mut bench.workshop(),
            &[tok(Resource::Word, 0), tok(Resource::Sound, 0)],
            3,
        )
        .unwrap();
        assert!(report.buff_started);
        assert!(bench.effects.is_active("Resonance"));
        assert!((bench.pools.current(Resource::Word) - 1.0).abs() < 1e-9);
        assert!((bench.pools.current(Resource::Sound) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn full_memory_rejects_new_buffs() {
        let mut book = RecipeBook::standard().unwrap();
        book.unlock("Resonance").unwrap();
        book.unlock("Call").unwrap();
        let mut bench = Bench::new(&[
            (Resource::Word, 10.0),
            (Resource::Sound, 10.0),
            (Resource::Thought, 10.0),
        ]);
        bench.effects = EffectScheduler::new(1);
        cast_recipe(&book, &mut bench.workshop(), "Resonance").unwrap();
        let failure = cast_recipe(&book, &mut bench.workshop(), "Call").unwrap_err();
        assert_eq!(
            failure.rejection,
            Rejection::CapacityExceeded { active: 1, slots: 1 }
        );
        assert!((bench.pools.current(Resource::Word) - 9.0).abs() < 1e-9);
    }

    #[test]
    fn charge_recipe_feeds_intone_until_locked() {
        let mut book = RecipeBook::standard().unwrap();
        book.unlock("Intone").unwrap();
        let mut bench = Bench::new(&[(Resource::Sound, 20.0)]);
        for _ in 0..5 {
            cast_recipe(&book, &mut bench.workshop(), "Intone").unwrap();
        }
        let failure = cast_recipe(&book, &mut bench.workshop(), "Intone").unwrap_err();
        assert!(matches!(failure.rejection, Rejection::ChargeLocked { .. }));
        assert!((bench.pools.current(Resource::Sound) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn locked_and_unknown_recipes() {
        let book = RecipeBook::standard().unwrap();
        let mut bench = Bench::new(&[]);
        let failure = cast_recipe(&book, &mut bench.workshop(), "Call").unwrap_err();
        assert!(matches!(failure.rejection, Rejection::RecipeLocked { .. }));
        let failure = cast_recipe(&book, &mut bench.workshop(), "Shout").unwrap_err();
        assert!(matches!(failure.rejection, Rejection::UnknownRecipe { .. }));
        assert!(failure.outcome().recipe.is_none());
    }

    #[test]
    fn xp_split_reaches_every_listed_skill() {
        let book = RecipeBook::new(vec![
            Recipe::new("Chant")
                .inputs([(Resource::Sound, 1)])
                .xp([
                    (SkillTag::Speech, 30.0),
                    (SkillTag::Calling, 30.0),
                    (SkillTag::Resonance, 30.0),
                ])
                .tags([RecipeTag::SingleCast]),
        ])
        .unwrap();
        let mut bench = Bench::new(&[(Resource::Sound, 5.0)]);
        cast_recipe(&book, &mut bench.workshop(), "Chant").unwrap();
        for skill in [SkillTag::Speech, SkillTag::Calling, SkillTag::Resonance] {
            assert!((bench.skills.get(skill).xp() - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn selection_helper_toggles_and_caps() {
        let mut sel = Selection::default();
        assert!(sel.toggle(tok(Resource::Insight, 0)));
        assert!(sel.toggle(tok(Resource::Insight, 1)));
        assert!(sel.toggle(tok(Resource::Sound, 0)));
        assert!(!sel.toggle(tok(Resource::Word, 0)));
        assert_eq!(sel.len(), 3);
        assert!(!sel.toggle(tok(Resource::Insight, 0)));
        assert_eq!(sel.len(), 2);
        let taken = sel.take();
        assert_eq!(taken.len(), 2);
        assert!(sel.is_empty());
    }
}
