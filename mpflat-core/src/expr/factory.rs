//! Arena-backed expression factory.
//!
//! All nodes live in one `Vec` and are addressed by [`ExprId`]. Children of
//! n-ary nodes, piecewise-linear data and string payloads are appended to
//! shared pools and referenced by spans, so a node never owns heap memory of
//! its own. Dropping the factory frees every node and function record at once.
//!
//! ## Contract
//!
//! `make_*` and `end_*` assert that kinds belong to the requested class, that
//! argument handles belong to this arena, and that builders were filled with
//! exactly the number of arguments declared at `begin_*`. A violation is a bug
//! in the caller and panics.

use super::handle::{
    BinaryExpr, BinaryLogicalExpr, CallExpr, CountExpr, Expr, ExprHandle, ExprId, Function,
    FunctionType, IfExpr, ImplicationExpr, IteratedExpr, IteratedLogicalExpr, LogicalConstant,
    LogicalCountExpr, LogicalExpr, NotExpr, NumericConstant, NumericExpr, PairwiseExpr, PlTerm,
    Reference, RelationalExpr, StringLiteral, SymbolicIfExpr, SymbolicNumberOfExpr, UnaryExpr,
};
use super::kind::Kind;
use smallvec::SmallVec;
use std::marker::PhantomData;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: u32,
    len: u32,
}

impl Span {
    #[inline]
    fn range(self) -> Range<usize> {
        self.start as usize..(self.start + self.len) as usize
    }
}

#[derive(Debug, Clone, Copy)]
enum NodeData {
    Number(f64),
    Reference(u32),
    Unary(ExprId),
    Binary(ExprId, ExprId),
    Ternary(ExprId, ExprId, ExprId),
    PlTerm { data: Span, arg: ExprId },
    Call { func: Function, args: Span },
    Nary(Span),
    Bool(bool),
    Str(Span),
}

#[derive(Debug, Clone, Copy)]
struct Node {
    kind: Kind,
    data: NodeData,
}

#[derive(Debug, Clone)]
struct FunctionInfo {
    name: String,
    num_args: i32,
    ty: FunctionType,
}

/// Builder for nodes whose argument count is known only at run time.
///
/// The count is fixed by the `begin_*` call that creates the builder and the
/// matching `end_*` call asserts that every slot was filled.
#[derive(Debug, Clone)]
#[must_use = "a builder must be finished with the matching end_* call"]
pub struct ArgBuilder<T> {
    kind: Kind,
    expected: usize,
    args: SmallVec<[ExprId; 8]>,
    func: Option<Function>,
    _marker: PhantomData<T>,
}

impl<T: ExprHandle> ArgBuilder<T> {
    fn new(kind: Kind, expected: usize, func: Option<Function>) -> Self {
        Self {
            kind,
            expected,
            args: SmallVec::with_capacity(expected.min(8)),
            func,
            _marker: PhantomData,
        }
    }

    /// Append the next argument.
    pub fn add_arg(&mut self, arg: impl Into<T>) {
        assert!(
            self.args.len() < self.expected,
            "{}: more than the declared {} arguments",
            self.kind,
            self.expected
        );
        self.args.push(arg.into().id());
    }

    /// Kind of the node under construction.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Declared number of arguments.
    pub fn num_args(&self) -> usize {
        self.expected
    }

    /// Number of arguments added so far.
    pub fn num_added(&self) -> usize {
        self.args.len()
    }

    /// Whether every declared slot is filled.
    pub fn is_complete(&self) -> bool {
        self.args.len() == self.expected
    }
}

/// Builder of iterated numeric expressions.
pub type IteratedExprBuilder = ArgBuilder<NumericExpr>;
/// Builder of number-of expressions; the first argument is the counted value.
pub type NumberOfExprBuilder = ArgBuilder<NumericExpr>;
/// Builder of symbolic number-of expressions.
pub type SymbolicNumberOfExprBuilder = ArgBuilder<Expr>;
/// Builder of count expressions.
pub type CountExprBuilder = ArgBuilder<LogicalExpr>;
/// Builder of iterated logical expressions.
pub type IteratedLogicalExprBuilder = ArgBuilder<LogicalExpr>;
/// Builder of pairwise expressions.
pub type PairwiseExprBuilder = ArgBuilder<NumericExpr>;
/// Builder of function calls.
pub type CallExprBuilder = ArgBuilder<Expr>;

/// Builder of piecewise-linear terms.
///
/// Slopes and breakpoints are added alternately, starting and ending with a
/// slope: `s0, b0, s1, ..., b(n-1), sn`.
#[derive(Debug, Clone)]
#[must_use = "a builder must be finished with end_pl_term"]
pub struct PlTermBuilder {
    num_breakpoints: usize,
    data: SmallVec<[f64; 16]>,
    num_slopes: usize,
    num_added_breakpoints: usize,
}

impl PlTermBuilder {
    /// Append the next slope.
    pub fn add_slope(&mut self, slope: f64) {
        assert!(
            self.num_slopes <= self.num_breakpoints,
            "pl term: more than {} slopes",
            self.num_breakpoints + 1
        );
        assert_eq!(
            self.num_slopes, self.num_added_breakpoints,
            "pl term: expected a breakpoint"
        );
        self.data.push(slope);
        self.num_slopes += 1;
    }

    /// Append the next breakpoint.
    pub fn add_breakpoint(&mut self, breakpoint: f64) {
        assert!(
            self.num_added_breakpoints < self.num_breakpoints,
            "pl term: more than {} breakpoints",
            self.num_breakpoints
        );
        assert_eq!(
            self.num_slopes,
            self.num_added_breakpoints + 1,
            "pl term: expected a slope"
        );
        self.data.push(breakpoint);
        self.num_added_breakpoints += 1;
    }

    fn is_complete(&self) -> bool {
        self.num_slopes == self.num_breakpoints + 1
            && self.num_added_breakpoints == self.num_breakpoints
    }
}

/// Iterator over the arguments of an n-ary node.
#[derive(Debug, Clone)]
pub struct ExprArgs<'a, T> {
    ids: std::slice::Iter<'a, ExprId>,
    _marker: PhantomData<T>,
}

impl<T: ExprHandle> Iterator for ExprArgs<'_, T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.ids.next().map(|&id| T::from_id_unchecked(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl<T: ExprHandle> DoubleEndedIterator for ExprArgs<'_, T> {
    fn next_back(&mut self) -> Option<T> {
        self.ids.next_back().map(|&id| T::from_id_unchecked(id))
    }
}

impl<T: ExprHandle> ExactSizeIterator for ExprArgs<'_, T> {}

/// Expression factory owning every node it creates.
#[derive(Debug, Clone, Default)]
pub struct ExprFactory {
    nodes: Vec<Node>,
    args: Vec<ExprId>,
    doubles: Vec<f64>,
    text: String,
    functions: Vec<FunctionInfo>,
}

impl ExprFactory {
    /// Create an empty factory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the arena.
    pub fn num_exprs(&self) -> usize {
        self.nodes.len()
    }

    /// Number of function records.
    pub fn num_functions(&self) -> usize {
        self.functions.len()
    }

    /// Handle of the node at a dense index.
    pub fn expr(&self, index: usize) -> Option<Expr> {
        (index < self.nodes.len()).then(|| Expr::from_id_unchecked(ExprId::new(index)))
    }

    /// Kind of a node.
    #[inline]
    pub fn kind(&self, e: impl ExprHandle) -> Kind {
        self.node(e.id()).kind
    }

    /// View a node through another handle type; `None` on kind mismatch.
    pub fn cast<T: ExprHandle>(&self, e: impl ExprHandle) -> Option<T> {
        let id = e.id();
        T::RANGE
            .contains(self.node(id).kind)
            .then(|| T::from_id_unchecked(id))
    }

    /// View a node through another handle type whose range is known to match.
    ///
    /// The kind is only checked in debug builds.
    #[inline]
    pub fn cast_unchecked<T: ExprHandle>(&self, e: impl ExprHandle) -> T {
        let id = e.id();
        debug_assert!(
            T::RANGE.contains(self.node(id).kind),
            "unchecked cast of {:?} node to {:?}..={:?}",
            self.node(id).kind,
            T::RANGE.first,
            T::RANGE.last
        );
        T::from_id_unchecked(id)
    }

    /// Whether `e` is the numeric constant zero.
    pub fn is_zero(&self, e: impl ExprHandle) -> bool {
        matches!(self.node(e.id()).data, NodeData::Number(v) if v == 0.0)
    }

    /// Direct children of a node, in storage order.
    pub fn children(&self, e: impl ExprHandle) -> SmallVec<[Expr; 4]> {
        let wrap = |id: ExprId| Expr::from_id_unchecked(id);
        match self.node(e.id()).data {
            NodeData::Number(_) | NodeData::Reference(_) | NodeData::Bool(_) | NodeData::Str(_) => {
                SmallVec::new()
            }
            NodeData::Unary(a) => smallvec::smallvec![wrap(a)],
            NodeData::Binary(a, b) => smallvec::smallvec![wrap(a), wrap(b)],
            NodeData::Ternary(a, b, c) => smallvec::smallvec![wrap(a), wrap(b), wrap(c)],
            NodeData::PlTerm { arg, .. } => smallvec::smallvec![wrap(arg)],
            NodeData::Call { args, .. } | NodeData::Nary(args) => {
                self.args[args.range()].iter().map(|&id| wrap(id)).collect()
            }
        }
    }

    // ---- numeric expressions ----

    /// Create a numeric constant.
    pub fn make_numeric_constant(&mut self, value: f64) -> NumericConstant {
        NumericConstant::from_id_unchecked(self.push(Kind::Number, NodeData::Number(value)))
    }

    /// Create a reference to variable `index`.
    pub fn make_variable(&mut self, index: usize) -> Reference {
        self.make_reference(Kind::Variable, index)
    }

    /// Create a reference to common expression `index`.
    pub fn make_common_expr(&mut self, index: usize) -> Reference {
        self.make_reference(Kind::CommonExpr, index)
    }

    fn make_reference(&mut self, kind: Kind, index: usize) -> Reference {
        assert!(index <= u32::MAX as usize, "reference index out of range");
        Reference::from_id_unchecked(self.push(kind, NodeData::Reference(index as u32)))
    }

    /// Create a unary numeric expression.
    pub fn make_unary(&mut self, kind: Kind, arg: impl Into<NumericExpr>) -> UnaryExpr {
        assert!(Kind::UNARY.contains(kind), "invalid unary expression kind {kind:?}");
        let arg = self.checked(arg.into());
        UnaryExpr::from_id_unchecked(self.push(kind, NodeData::Unary(arg)))
    }

    /// Create a binary numeric expression.
    pub fn make_binary(
        &mut self,
        kind: Kind,
        lhs: impl Into<NumericExpr>,
        rhs: impl Into<NumericExpr>,
    ) -> BinaryExpr {
        assert!(Kind::BINARY.contains(kind), "invalid binary expression kind {kind:?}");
        let lhs = self.checked(lhs.into());
        let rhs = self.checked(rhs.into());
        BinaryExpr::from_id_unchecked(self.push(kind, NodeData::Binary(lhs, rhs)))
    }

    /// Create a numeric if-then-else.
    pub fn make_if(
        &mut self,
        condition: impl Into<LogicalExpr>,
        then_expr: impl Into<NumericExpr>,
        else_expr: impl Into<NumericExpr>,
    ) -> IfExpr {
        let c = self.checked(condition.into());
        let t = self.checked(then_expr.into());
        let e = self.checked(else_expr.into());
        IfExpr::from_id_unchecked(self.push(Kind::If, NodeData::Ternary(c, t, e)))
    }

    /// Start a piecewise-linear term with `num_breakpoints > 0` breakpoints.
    pub fn begin_pl_term(&self, num_breakpoints: usize) -> PlTermBuilder {
        assert!(num_breakpoints > 0, "pl term needs at least one breakpoint");
        PlTermBuilder {
            num_breakpoints,
            data: SmallVec::with_capacity(2 * num_breakpoints + 1),
            num_slopes: 0,
            num_added_breakpoints: 0,
        }
    }

    /// Finish a piecewise-linear term of argument `arg`.
    pub fn end_pl_term(&mut self, builder: PlTermBuilder, arg: Reference) -> PlTerm {
        assert!(
            builder.is_complete(),
            "pl term: {} of {} slopes and {} of {} breakpoints added",
            builder.num_slopes,
            builder.num_breakpoints + 1,
            builder.num_added_breakpoints,
            builder.num_breakpoints
        );
        let arg = self.checked(arg);
        let start = self.doubles.len() as u32;
        self.doubles.extend_from_slice(&builder.data);
        let data = Span {
            start,
            len: builder.data.len() as u32,
        };
        PlTerm::from_id_unchecked(self.push(Kind::PlTerm, NodeData::PlTerm { data, arg }))
    }

    /// Register an external function. A negative `num_args` means variable arity.
    pub fn add_function(&mut self, name: &str, num_args: i32, ty: FunctionType) -> Function {
        let f = Function(self.functions.len() as u32);
        self.functions.push(FunctionInfo {
            name: name.to_string(),
            num_args,
            ty,
        });
        f
    }

    /// Function record at `index`.
    pub fn function(&self, index: usize) -> Option<Function> {
        (index < self.functions.len()).then_some(Function(index as u32))
    }

    /// Start a call of `func` with `num_args` arguments.
    pub fn begin_call(&self, func: Function, num_args: usize) -> CallExprBuilder {
        let info = self.function_info(func);
        assert!(
            info.num_args < 0 || info.num_args as usize == num_args,
            "function {} takes {} arguments, not {num_args}",
            info.name,
            info.num_args
        );
        ArgBuilder::new(Kind::Call, num_args, Some(func))
    }

    /// Finish a function call.
    pub fn end_call(&mut self, builder: CallExprBuilder) -> CallExpr {
        assert_eq!(builder.kind, Kind::Call, "not a call builder");
        let Some(func) = builder.func else {
            panic!("call builder without function");
        };
        let args = self.finish_args(&builder);
        CallExpr::from_id_unchecked(self.push(Kind::Call, NodeData::Call { func, args }))
    }

    /// Start an iterated numeric expression.
    pub fn begin_iterated(&self, kind: Kind, num_args: usize) -> IteratedExprBuilder {
        assert!(Kind::ITERATED.contains(kind), "invalid iterated expression kind {kind:?}");
        ArgBuilder::new(kind, num_args, None)
    }

    /// Finish an iterated numeric expression.
    pub fn end_iterated(&mut self, builder: IteratedExprBuilder) -> IteratedExpr {
        assert!(Kind::ITERATED.contains(builder.kind), "not an iterated builder");
        let args = self.finish_args(&builder);
        IteratedExpr::from_id_unchecked(self.push(builder.kind, NodeData::Nary(args)))
    }

    /// Create an iterated numeric expression from a slice of arguments.
    pub fn make_iterated(&mut self, kind: Kind, args: &[NumericExpr]) -> IteratedExpr {
        let mut builder = self.begin_iterated(kind, args.len());
        for &arg in args {
            builder.add_arg(arg);
        }
        self.end_iterated(builder)
    }

    /// Start a number-of expression. `num_args` counts `value` too.
    pub fn begin_number_of(
        &self,
        num_args: usize,
        value: impl Into<NumericExpr>,
    ) -> NumberOfExprBuilder {
        assert!(num_args > 0, "numberof needs the counted value");
        let mut builder = ArgBuilder::new(Kind::NumberOf, num_args, None);
        builder.add_arg(value);
        builder
    }

    /// Finish a number-of expression.
    pub fn end_number_of(&mut self, builder: NumberOfExprBuilder) -> IteratedExpr {
        assert_eq!(builder.kind, Kind::NumberOf, "not a numberof builder");
        self.end_iterated(builder)
    }

    /// Start a symbolic number-of expression. `num_args` counts `value` too.
    pub fn begin_symbolic_number_of(
        &self,
        num_args: usize,
        value: impl Into<Expr>,
    ) -> SymbolicNumberOfExprBuilder {
        assert!(num_args > 0, "numberof needs the counted value");
        let mut builder = ArgBuilder::new(Kind::NumberOfSym, num_args, None);
        builder.add_arg(value);
        builder
    }

    /// Finish a symbolic number-of expression.
    pub fn end_symbolic_number_of(
        &mut self,
        builder: SymbolicNumberOfExprBuilder,
    ) -> SymbolicNumberOfExpr {
        assert_eq!(builder.kind, Kind::NumberOfSym, "not a symbolic numberof builder");
        let args = self.finish_args(&builder);
        SymbolicNumberOfExpr::from_id_unchecked(self.push(Kind::NumberOfSym, NodeData::Nary(args)))
    }

    /// Start a count expression.
    pub fn begin_count(&self, num_args: usize) -> CountExprBuilder {
        ArgBuilder::new(Kind::Count, num_args, None)
    }

    /// Finish a count expression.
    pub fn end_count(&mut self, builder: CountExprBuilder) -> CountExpr {
        assert_eq!(builder.kind, Kind::Count, "not a count builder");
        let args = self.finish_args(&builder);
        CountExpr::from_id_unchecked(self.push(Kind::Count, NodeData::Nary(args)))
    }

    // ---- logical expressions ----

    /// Create a logical constant.
    pub fn make_logical_constant(&mut self, value: bool) -> LogicalConstant {
        LogicalConstant::from_id_unchecked(self.push(Kind::Bool, NodeData::Bool(value)))
    }

    /// Create a logical negation.
    pub fn make_not(&mut self, arg: impl Into<LogicalExpr>) -> NotExpr {
        let arg = self.checked(arg.into());
        NotExpr::from_id_unchecked(self.push(Kind::Not, NodeData::Unary(arg)))
    }

    /// Create a binary logical expression.
    pub fn make_binary_logical(
        &mut self,
        kind: Kind,
        lhs: impl Into<LogicalExpr>,
        rhs: impl Into<LogicalExpr>,
    ) -> BinaryLogicalExpr {
        assert!(
            Kind::BINARY_LOGICAL.contains(kind),
            "invalid binary logical expression kind {kind:?}"
        );
        let lhs = self.checked(lhs.into());
        let rhs = self.checked(rhs.into());
        BinaryLogicalExpr::from_id_unchecked(self.push(kind, NodeData::Binary(lhs, rhs)))
    }

    /// Create a relational expression.
    pub fn make_relational(
        &mut self,
        kind: Kind,
        lhs: impl Into<NumericExpr>,
        rhs: impl Into<NumericExpr>,
    ) -> RelationalExpr {
        assert!(Kind::RELATIONAL.contains(kind), "invalid relational expression kind {kind:?}");
        let lhs = self.checked(lhs.into());
        let rhs = self.checked(rhs.into());
        RelationalExpr::from_id_unchecked(self.push(kind, NodeData::Binary(lhs, rhs)))
    }

    /// Create a logical count expression.
    pub fn make_logical_count(
        &mut self,
        kind: Kind,
        lhs: impl Into<NumericExpr>,
        rhs: CountExpr,
    ) -> LogicalCountExpr {
        assert!(
            Kind::LOGICAL_COUNT.contains(kind),
            "invalid logical count expression kind {kind:?}"
        );
        let lhs = self.checked(lhs.into());
        let rhs = self.checked(rhs);
        LogicalCountExpr::from_id_unchecked(self.push(kind, NodeData::Binary(lhs, rhs)))
    }

    /// Create a logical if-then-else.
    pub fn make_implication(
        &mut self,
        condition: impl Into<LogicalExpr>,
        then_expr: impl Into<LogicalExpr>,
        else_expr: impl Into<LogicalExpr>,
    ) -> ImplicationExpr {
        let c = self.checked(condition.into());
        let t = self.checked(then_expr.into());
        let e = self.checked(else_expr.into());
        ImplicationExpr::from_id_unchecked(self.push(Kind::Implication, NodeData::Ternary(c, t, e)))
    }

    /// Start an iterated logical expression.
    pub fn begin_iterated_logical(&self, kind: Kind, num_args: usize) -> IteratedLogicalExprBuilder {
        assert!(
            Kind::ITERATED_LOGICAL.contains(kind),
            "invalid iterated logical expression kind {kind:?}"
        );
        ArgBuilder::new(kind, num_args, None)
    }

    /// Finish an iterated logical expression.
    pub fn end_iterated_logical(&mut self, builder: IteratedLogicalExprBuilder) -> IteratedLogicalExpr {
        assert!(
            Kind::ITERATED_LOGICAL.contains(builder.kind),
            "not an iterated logical builder"
        );
        let args = self.finish_args(&builder);
        IteratedLogicalExpr::from_id_unchecked(self.push(builder.kind, NodeData::Nary(args)))
    }

    /// Start a pairwise expression.
    pub fn begin_pairwise(&self, kind: Kind, num_args: usize) -> PairwiseExprBuilder {
        assert!(Kind::PAIRWISE.contains(kind), "invalid pairwise expression kind {kind:?}");
        ArgBuilder::new(kind, num_args, None)
    }

    /// Finish a pairwise expression.
    pub fn end_pairwise(&mut self, builder: PairwiseExprBuilder) -> PairwiseExpr {
        assert!(Kind::PAIRWISE.contains(builder.kind), "not a pairwise builder");
        let args = self.finish_args(&builder);
        PairwiseExpr::from_id_unchecked(self.push(builder.kind, NodeData::Nary(args)))
    }

    // ---- symbolic expressions ----

    /// Create a string literal. The text is copied into the arena.
    pub fn make_string(&mut self, value: &str) -> StringLiteral {
        let start = self.text.len() as u32;
        self.text.push_str(value);
        let span = Span {
            start,
            len: value.len() as u32,
        };
        StringLiteral::from_id_unchecked(self.push(Kind::String, NodeData::Str(span)))
    }

    /// Create a symbolic if-then-else.
    pub fn make_symbolic_if(
        &mut self,
        condition: impl Into<LogicalExpr>,
        then_expr: impl Into<Expr>,
        else_expr: impl Into<Expr>,
    ) -> SymbolicIfExpr {
        let c = self.checked(condition.into());
        let t = self.checked(then_expr.into());
        let e = self.checked(else_expr.into());
        SymbolicIfExpr::from_id_unchecked(self.push(Kind::IfSym, NodeData::Ternary(c, t, e)))
    }

    // ---- internals ----

    fn push(&mut self, kind: Kind, data: NodeData) -> ExprId {
        let id = ExprId::new(self.nodes.len());
        self.nodes.push(Node { kind, data });
        id
    }

    #[inline]
    fn node(&self, id: ExprId) -> &Node {
        match self.nodes.get(id.index()) {
            Some(node) => node,
            None => panic!("{id:?} does not belong to this expression factory"),
        }
    }

    fn checked(&self, e: impl ExprHandle) -> ExprId {
        let id = e.id();
        assert!(
            id.index() < self.nodes.len(),
            "{id:?} does not belong to this expression factory"
        );
        id
    }

    fn finish_args<T: ExprHandle>(&mut self, builder: &ArgBuilder<T>) -> Span {
        assert!(
            builder.is_complete(),
            "{}: only {} of {} arguments added",
            builder.kind,
            builder.args.len(),
            builder.expected
        );
        for &id in &builder.args {
            self.checked(Expr::from_id_unchecked(id));
        }
        let start = self.args.len() as u32;
        self.args.extend_from_slice(&builder.args);
        Span {
            start,
            len: builder.args.len() as u32,
        }
    }

    fn function_info(&self, f: Function) -> &FunctionInfo {
        match self.functions.get(f.index()) {
            Some(info) => info,
            None => panic!("{f:?} does not belong to this expression factory"),
        }
    }

    fn data(&self, id: ExprId) -> NodeData {
        self.node(id).data
    }

    fn nary(&self, id: ExprId) -> &[ExprId] {
        match self.data(id) {
            NodeData::Nary(span) | NodeData::Call { args: span, .. } => &self.args[span.range()],
            other => unreachable!("{other:?} has no argument list"),
        }
    }

    fn unary(&self, id: ExprId) -> ExprId {
        match self.data(id) {
            NodeData::Unary(a) => a,
            other => unreachable!("{other:?} is not unary"),
        }
    }

    fn binary(&self, id: ExprId) -> (ExprId, ExprId) {
        match self.data(id) {
            NodeData::Binary(a, b) => (a, b),
            other => unreachable!("{other:?} is not binary"),
        }
    }

    fn ternary(&self, id: ExprId) -> (ExprId, ExprId, ExprId) {
        match self.data(id) {
            NodeData::Ternary(a, b, c) => (a, b, c),
            other => unreachable!("{other:?} is not ternary"),
        }
    }

    fn pl_data(&self, id: ExprId) -> (&[f64], ExprId) {
        match self.data(id) {
            NodeData::PlTerm { data, arg } => (&self.doubles[data.range()], arg),
            other => unreachable!("{other:?} is not a pl term"),
        }
    }
}

macro_rules! nary_accessors {
    ($($handle:ident => $arg:ident),+ $(,)?) => {
        $(
            impl $handle {
                /// Number of arguments.
                pub fn num_args(self, f: &ExprFactory) -> usize {
                    f.nary(self.id()).len()
                }

                /// Argument at `index`.
                pub fn arg(self, f: &ExprFactory, index: usize) -> $arg {
                    $arg::from_id_unchecked(f.nary(self.id())[index])
                }

                /// Iterate over the arguments.
                pub fn args(self, f: &ExprFactory) -> ExprArgs<'_, $arg> {
                    ExprArgs {
                        ids: f.nary(self.id()).iter(),
                        _marker: PhantomData,
                    }
                }
            }
        )+
    };
}

nary_accessors!(
    IteratedExpr => NumericExpr,
    SymbolicNumberOfExpr => Expr,
    CountExpr => LogicalExpr,
    IteratedLogicalExpr => LogicalExpr,
    PairwiseExpr => NumericExpr,
    CallExpr => Expr,
);

impl NumericConstant {
    /// Value of the constant.
    pub fn value(self, f: &ExprFactory) -> f64 {
        match f.data(self.id()) {
            NodeData::Number(v) => v,
            other => unreachable!("{other:?} is not a number"),
        }
    }
}

impl Reference {
    /// Index of the referenced variable or common expression.
    pub fn index(self, f: &ExprFactory) -> usize {
        match f.data(self.id()) {
            NodeData::Reference(i) => i as usize,
            other => unreachable!("{other:?} is not a reference"),
        }
    }
}

impl UnaryExpr {
    /// Operand.
    pub fn arg(self, f: &ExprFactory) -> NumericExpr {
        NumericExpr::from_id_unchecked(f.unary(self.id()))
    }
}

impl BinaryExpr {
    /// Left operand.
    pub fn lhs(self, f: &ExprFactory) -> NumericExpr {
        NumericExpr::from_id_unchecked(f.binary(self.id()).0)
    }

    /// Right operand.
    pub fn rhs(self, f: &ExprFactory) -> NumericExpr {
        NumericExpr::from_id_unchecked(f.binary(self.id()).1)
    }
}

impl IfExpr {
    /// Condition.
    pub fn condition(self, f: &ExprFactory) -> LogicalExpr {
        LogicalExpr::from_id_unchecked(f.ternary(self.id()).0)
    }

    /// Value when the condition holds.
    pub fn then_expr(self, f: &ExprFactory) -> NumericExpr {
        NumericExpr::from_id_unchecked(f.ternary(self.id()).1)
    }

    /// Value otherwise.
    pub fn else_expr(self, f: &ExprFactory) -> NumericExpr {
        NumericExpr::from_id_unchecked(f.ternary(self.id()).2)
    }
}

impl PlTerm {
    /// Number of breakpoints.
    pub fn num_breakpoints(self, f: &ExprFactory) -> usize {
        f.pl_data(self.id()).0.len() / 2
    }

    /// Number of slopes, one more than the number of breakpoints.
    pub fn num_slopes(self, f: &ExprFactory) -> usize {
        self.num_breakpoints(f) + 1
    }

    /// Slope at `index`.
    pub fn slope(self, f: &ExprFactory, index: usize) -> f64 {
        assert!(index < self.num_slopes(f), "slope index out of range");
        f.pl_data(self.id()).0[2 * index]
    }

    /// Breakpoint at `index`.
    pub fn breakpoint(self, f: &ExprFactory, index: usize) -> f64 {
        assert!(index < self.num_breakpoints(f), "breakpoint index out of range");
        f.pl_data(self.id()).0[2 * index + 1]
    }

    /// All slopes in order.
    pub fn slopes(self, f: &ExprFactory) -> Vec<f64> {
        f.pl_data(self.id()).0.iter().step_by(2).copied().collect()
    }

    /// All breakpoints in order.
    pub fn breakpoints(self, f: &ExprFactory) -> Vec<f64> {
        f.pl_data(self.id()).0.iter().skip(1).step_by(2).copied().collect()
    }

    /// Argument of the term.
    pub fn arg(self, f: &ExprFactory) -> Reference {
        Reference::from_id_unchecked(f.pl_data(self.id()).1)
    }
}

impl CallExpr {
    /// Called function.
    pub fn function(self, f: &ExprFactory) -> Function {
        match f.data(self.id()) {
            NodeData::Call { func, .. } => func,
            other => unreachable!("{other:?} is not a call"),
        }
    }
}

impl LogicalConstant {
    /// Value of the constant.
    pub fn value(self, f: &ExprFactory) -> bool {
        match f.data(self.id()) {
            NodeData::Bool(v) => v,
            other => unreachable!("{other:?} is not a logical constant"),
        }
    }
}

impl NotExpr {
    /// Negated operand.
    pub fn arg(self, f: &ExprFactory) -> LogicalExpr {
        LogicalExpr::from_id_unchecked(f.unary(self.id()))
    }
}

impl BinaryLogicalExpr {
    /// Left operand.
    pub fn lhs(self, f: &ExprFactory) -> LogicalExpr {
        LogicalExpr::from_id_unchecked(f.binary(self.id()).0)
    }

    /// Right operand.
    pub fn rhs(self, f: &ExprFactory) -> LogicalExpr {
        LogicalExpr::from_id_unchecked(f.binary(self.id()).1)
    }
}

impl RelationalExpr {
    /// Left operand.
    pub fn lhs(self, f: &ExprFactory) -> NumericExpr {
        NumericExpr::from_id_unchecked(f.binary(self.id()).0)
    }

    /// Right operand.
    pub fn rhs(self, f: &ExprFactory) -> NumericExpr {
        NumericExpr::from_id_unchecked(f.binary(self.id()).1)
    }
}

impl LogicalCountExpr {
    /// Threshold operand.
    pub fn lhs(self, f: &ExprFactory) -> NumericExpr {
        NumericExpr::from_id_unchecked(f.binary(self.id()).0)
    }

    /// Counted conditions.
    pub fn rhs(self, f: &ExprFactory) -> CountExpr {
        CountExpr::from_id_unchecked(f.binary(self.id()).1)
    }
}

impl ImplicationExpr {
    /// Condition.
    pub fn condition(self, f: &ExprFactory) -> LogicalExpr {
        LogicalExpr::from_id_unchecked(f.ternary(self.id()).0)
    }

    /// Value when the condition holds.
    pub fn then_expr(self, f: &ExprFactory) -> LogicalExpr {
        LogicalExpr::from_id_unchecked(f.ternary(self.id()).1)
    }

    /// Value otherwise.
    pub fn else_expr(self, f: &ExprFactory) -> LogicalExpr {
        LogicalExpr::from_id_unchecked(f.ternary(self.id()).2)
    }
}

impl StringLiteral {
    /// Text of the literal.
    pub fn value(self, f: &ExprFactory) -> &str {
        match f.data(self.id()) {
            NodeData::Str(span) => &f.text[span.range()],
            other => unreachable!("{other:?} is not a string"),
        }
    }
}

impl SymbolicIfExpr {
    /// Condition.
    pub fn condition(self, f: &ExprFactory) -> LogicalExpr {
        LogicalExpr::from_id_unchecked(f.ternary(self.id()).0)
    }

    /// Value when the condition holds.
    pub fn then_expr(self, f: &ExprFactory) -> Expr {
        Expr::from_id_unchecked(f.ternary(self.id()).1)
    }

    /// Value otherwise.
    pub fn else_expr(self, f: &ExprFactory) -> Expr {
        Expr::from_id_unchecked(f.ternary(self.id()).2)
    }
}

impl Function {
    /// Name of the function.
    pub fn name(self, f: &ExprFactory) -> &str {
        &f.function_info(self).name
    }

    /// Declared arity; negative for variable arity.
    pub fn num_args(self, f: &ExprFactory) -> i32 {
        f.function_info(self).num_args
    }

    /// Result type.
    pub fn ty(self, f: &ExprFactory) -> FunctionType {
        f.function_info(self).ty
    }
}
