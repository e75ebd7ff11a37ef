//! Argument-less control sequences accepted in math mode.

const KNOWN: &[&str] = &[
    // greek and letterlike
    "alpha", "beta", "gamma", "delta", "epsilon", "varepsilon", "zeta", "eta", "theta",
    "vartheta", "iota", "kappa", "varkappa", "lambda", "mu", "nu", "xi", "omicron", "pi",
    "varpi", "rho", "varrho", "sigma", "varsigma", "tau", "upsilon", "phi", "varphi", "chi",
    "psi", "omega", "Gamma", "Delta", "Theta", "Lambda", "Xi", "Pi", "Sigma", "Upsilon", "Phi",
    "Psi", "Omega", "varGamma", "varDelta", "varTheta", "varLambda", "varXi", "varPi",
    "varSigma", "varUpsilon", "varPhi", "varPsi", "varOmega", "digamma", "ell", "hbar",
    "hslash", "imath", "jmath", "aleph", "beth", "gimel", "daleth", "wp", "Re", "Im",
    "partial", "infty", "nabla", "forall", "exists", "nexists", "emptyset", "varnothing",
    "complement", "Finv", "Game", "mho", "eth", "prime", "backprime",
    // large operators
    "sum", "prod", "coprod", "int", "iint", "iiint", "iiiint", "oint", "intop", "smallint",
    "bigcup", "bigcap", "bigsqcup", "bigvee", "bigwedge", "bigodot", "bigoplus", "bigotimes",
    "biguplus",
    // named functions
    "arccos", "arcsin", "arctan", "arg", "cos", "cosh", "cot", "coth", "csc", "deg", "det",
    "dim", "exp", "gcd", "hom", "inf", "injlim", "ker", "lg", "lim", "liminf", "limsup", "ln",
    "log", "max", "min", "Pr", "projlim", "sec", "sin", "sinh", "sup", "tan", "tanh",
    "varlimsup", "varliminf", "varinjlim", "varprojlim", "bmod", "mod",
    // binary operators
    "pm", "mp", "times", "div", "cdot", "ast", "star", "circ", "bullet", "oplus", "ominus",
    "otimes", "oslash", "odot", "cup", "cap", "setminus", "smallsetminus", "wedge", "vee",
    "land", "lor", "sqcup", "sqcap", "uplus", "amalg", "dagger", "ddagger", "wr", "diamond",
    "bigtriangleup", "bigtriangledown", "triangleleft", "triangleright", "lhd", "rhd",
    "unlhd", "unrhd", "bigcirc", "dotplus", "ltimes", "rtimes", "leftthreetimes",
    "rightthreetimes", "curlywedge", "curlyvee", "barwedge", "doublebarwedge", "boxplus",
    "boxminus", "boxtimes", "boxdot", "circledast", "circledcirc", "circleddash", "centerdot",
    "intercal", "divideontimes",
    // relations
    "leq", "le", "geq", "ge", "neq", "ne", "equiv", "approx", "approxeq", "sim", "simeq",
    "cong", "propto", "subset", "supset", "subseteq", "supseteq", "subsetneq", "supsetneq",
    "sqsubset", "sqsupset", "sqsubseteq", "sqsupseteq", "in", "ni", "notin", "owns", "mid",
    "nmid", "parallel", "nparallel", "perp", "ll", "gg", "lll", "ggg", "prec", "succ",
    "preceq", "succeq", "precsim", "succsim", "models", "vdash", "dashv", "vDash", "Vdash",
    "Vvdash", "doteq", "doteqdot", "asymp", "bowtie", "smile", "frown", "leqq", "geqq",
    "leqslant", "geqslant", "lesssim", "gtrsim", "lessapprox", "gtrapprox", "lessgtr",
    "gtrless", "nless", "ngtr", "nleq", "ngeq", "nleqslant", "ngeqslant", "nsim", "ncong",
    "nsubseteq", "nsupseteq", "lneq", "gneq", "lneqq", "gneqq", "thicksim", "thickapprox",
    "backsim", "backsimeq", "eqsim", "triangleq", "trianglelefteq", "trianglerighteq",
    "vartriangleleft", "vartriangleright", "ntriangleleft", "ntriangleright", "because",
    "therefore", "between", "pitchfork", "shortmid", "shortparallel", "risingdotseq",
    "fallingdotseq", "circeq", "bumpeq", "Bumpeq", "Subset", "Supset",
    // arrows
    "to", "gets", "leftarrow", "rightarrow", "Leftarrow", "Rightarrow", "leftrightarrow",
    "Leftrightarrow", "longleftarrow", "longrightarrow", "Longleftarrow", "Longrightarrow",
    "longleftrightarrow", "Longleftrightarrow", "mapsto", "longmapsto", "implies",
    "impliedby", "iff", "uparrow", "downarrow", "updownarrow", "Uparrow", "Downarrow",
    "Updownarrow", "nearrow", "searrow", "swarrow", "nwarrow", "hookleftarrow",
    "hookrightarrow", "leftharpoonup", "leftharpoondown", "rightharpoonup",
    "rightharpoondown", "rightleftharpoons", "leftrightharpoons", "upharpoonleft",
    "upharpoonright", "downharpoonleft", "downharpoonright", "leftleftarrows",
    "rightrightarrows", "leftrightarrows", "rightleftarrows", "twoheadrightarrow",
    "twoheadleftarrow", "rightarrowtail", "leftarrowtail", "curvearrowleft",
    "curvearrowright", "circlearrowleft", "circlearrowright", "Lsh", "Rsh", "looparrowleft",
    "looparrowright", "leadsto", "nleftarrow", "nrightarrow", "nLeftarrow", "nRightarrow",
    "nleftrightarrow", "nLeftrightarrow", "dashrightarrow", "dashleftarrow", "restriction",
    "multimap",
    // miscellaneous symbols
    "angle", "measuredangle", "sphericalangle", "triangle", "vartriangle", "triangledown",
    "blacktriangle", "blacktriangledown", "blacktriangleleft", "blacktriangleright", "square",
    "Box", "blacksquare", "lozenge", "blacklozenge", "bigstar", "diamondsuit", "heartsuit",
    "clubsuit", "spadesuit", "flat", "natural", "sharp", "surd", "top", "bot", "neg", "lnot",
    "checkmark", "maltese", "S", "P", "dag", "ddag", "copyright", "pounds", "yen", "circledR",
    "circledS", "degree", "colon", "ldots", "cdots", "vdots", "ddots", "dots", "dotsc",
    "dotsb", "dotsm", "dotsi", "dotso", "ldotp", "cdotp", "iddots",
    // delimiters outside \left and \right
    "langle", "rangle", "lfloor", "rfloor", "lceil", "rceil", "vert", "Vert", "lvert",
    "rvert", "lVert", "rVert", "lbrace", "rbrace", "lbrack", "rbrack", "backslash",
    "ulcorner", "urcorner", "llcorner", "lrcorner", "lgroup", "rgroup", "lmoustache",
    "rmoustache",
    // spacing, style switches and infix fractions
    "quad", "qquad", "enspace", "thinspace", "medspace", "thickspace", "negthinspace",
    "displaystyle", "textstyle", "scriptstyle", "scriptscriptstyle", "limits", "nolimits",
    "rm", "bf", "it", "sf", "tt", "cal", "mit", "mathstrut", "strut", "hline", "cr",
    "newline", "nonumber", "notag", "hfill", "over", "choose", "atop", "brace", "brack",
];

pub(super) fn is_known(name: &str) -> bool {
    KNOWN.contains(&name)
}
