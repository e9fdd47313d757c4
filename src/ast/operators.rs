/// Reserved operators of the expression language.
///
/// Each operator is written as a single-entry JSON object whose key is the
/// operator [token](Operator::token), e.g. `{"$gt": ["@age", 18]}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    // Comparison
    /// Loose equality (`$eq`)
    Eq,
    /// Strict, type-sensitive equality (`$eqs`)
    Eqs,
    /// Loose inequality (`$ne`)
    Ne,
    /// Strict inequality (`$nes`)
    Nes,
    /// Greater than (`$gt`)
    Gt,
    /// Greater than or equal (`$gte`)
    Gte,
    /// Less than (`$lt`)
    Lt,
    /// Less than or equal (`$lte`)
    Lte,
    /// Inclusive range check (`$between`)
    Between,
    /// Anchored regular expression match (`$regex`)
    Regex,
    /// Membership (`$in`)
    In,
    /// Non-membership (`$nin`)
    Nin,

    // Null checks
    /// `$isNull`
    IsNull,
    /// `$nonNull`
    NonNull,

    // Logical
    /// `$and`
    And,
    /// `$or`
    Or,
    /// `$not`
    Not,
    /// `$nor`
    Nor,
    /// `$xor`
    Xor,

    // Branching
    /// `$cond`: `(condition, then[, else])`
    Conditional,
    /// `$nvl`: `(value, fallback)` or `(value, when_present, when_null)`
    Nvl,

    // Sequencing
    /// `$distinct`
    Distinct,
    /// `$return`
    Return,
    /// `$sub`
    Subroutine,

    // Comprehensions
    /// `$filter`: `(list, {"$decl": "x"}, predicate)`
    Filter,
    /// `$map`: `(list, {"$decl": "x"}, body)`
    Map,
    /// `$sort`: `(list, {"$decl": "a,b"}, comparator)`
    Sort,
    /// `$max`: `(list, {"$decl": "a,b"}, comparator)`
    Max,
    /// `$min`: `(list, {"$decl": "a,b"}, comparator)`
    Min,
    /// `$reduce`: `(list[, initial], {"$decl": "acc,it"}, body)`
    Reduce,
    /// `$collect`: `(list, initial, {"$decl": "acc,it"}, body)`
    Collect,
}

/// Shape family an operator belongs to, used by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Exactly two operands
    Binary,
    /// Exactly one operand
    Unary,
    /// Two operands, the second a literal pattern
    Pattern,
    /// Exactly three operands
    Range,
    /// Two or three operands
    Ternary,
    /// At least one operand
    Variadic,
    /// `(list, decl[x], body)`
    SingleBind,
    /// `(list, decl[a, b], body)`
    DoubleBind,
    /// `(list[, initial], decl[acc, it], body)`
    Fold,
    /// `(list, initial, decl[acc, it], body)`
    Collect,
}

impl Operator {
    pub const ALL: [Operator; 31] = [
        Operator::Eq,
        Operator::Eqs,
        Operator::Ne,
        Operator::Nes,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Between,
        Operator::Regex,
        Operator::In,
        Operator::Nin,
        Operator::IsNull,
        Operator::NonNull,
        Operator::And,
        Operator::Or,
        Operator::Not,
        Operator::Nor,
        Operator::Xor,
        Operator::Conditional,
        Operator::Nvl,
        Operator::Distinct,
        Operator::Return,
        Operator::Subroutine,
        Operator::Filter,
        Operator::Map,
        Operator::Sort,
        Operator::Max,
        Operator::Min,
        Operator::Reduce,
        Operator::Collect,
    ];

    /// The reserved object key for this operator.
    pub fn token(self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Eqs => "$eqs",
            Operator::Ne => "$ne",
            Operator::Nes => "$nes",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::Between => "$between",
            Operator::Regex => "$regex",
            Operator::In => "$in",
            Operator::Nin => "$nin",
            Operator::IsNull => "$isNull",
            Operator::NonNull => "$nonNull",
            Operator::And => "$and",
            Operator::Or => "$or",
            Operator::Not => "$not",
            Operator::Nor => "$nor",
            Operator::Xor => "$xor",
            Operator::Conditional => "$cond",
            Operator::Nvl => "$nvl",
            Operator::Distinct => "$distinct",
            Operator::Return => "$return",
            Operator::Subroutine => "$sub",
            Operator::Filter => "$filter",
            Operator::Map => "$map",
            Operator::Sort => "$sort",
            Operator::Max => "$max",
            Operator::Min => "$min",
            Operator::Reduce => "$reduce",
            Operator::Collect => "$collect",
        }
    }

    /// Look up an operator by its reserved key.
    pub fn from_token(token: &str) -> Option<Operator> {
        Operator::ALL.into_iter().find(|op| op.token() == token)
    }

    pub fn category(self) -> Category {
        use Operator::*;
        match self {
            Eq | Eqs | Ne | Nes | Gt | Gte | Lt | Lte | Xor => Category::Binary,
            IsNull | NonNull => Category::Unary,
            Regex => Category::Pattern,
            Between => Category::Range,
            Conditional | Nvl => Category::Ternary,
            And | Or | Not | Nor | In | Nin | Distinct | Return | Subroutine => {
                Category::Variadic
            }
            Filter | Map => Category::SingleBind,
            Sort | Max | Min => Category::DoubleBind,
            Reduce => Category::Fold,
            Collect => Category::Collect,
        }
    }

    /// Whether this operator iterates a list with bound names.
    pub fn is_comprehension(self) -> bool {
        matches!(
            self.category(),
            Category::SingleBind | Category::DoubleBind | Category::Fold | Category::Collect
        )
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}
