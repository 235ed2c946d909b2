/// These are the states in which the tokenizer can be in. The numbers refer to the sections of
/// the WHATWG HTML standard (13.2.5 Tokenization).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// 13.2.5.1 Data state
    Data,

    /// 13.2.5.2 RCDATA state
    RCDATA,

    /// 13.2.5.3 RAWTEXT state
    RAWTEXT,

    /// 13.2.5.4 Script data state
    ScriptData,

    /// 13.2.5.5 PLAINTEXT state
    PLAINTEXT,

    /// 13.2.5.6 Tag open state
    TagOpen,

    /// 13.2.5.7 End tag open state
    EndTagOpen,

    /// 13.2.5.8 Tag name state
    TagName,

    /// 13.2.5.9 RCDATA less-than sign state
    RCDATALessThanSign,

    /// 13.2.5.10 RCDATA end tag open state
    RCDATAEndTagOpen,

    /// 13.2.5.11 RCDATA end tag name state
    RCDATAEndTagName,

    /// 13.2.5.12 RAWTEXT less-than sign state
    RAWTEXTLessThanSign,

    /// 13.2.5.13 RAWTEXT end tag open state
    RAWTEXTEndTagOpen,

    /// 13.2.5.14 RAWTEXT end tag name state
    RAWTEXTEndTagName,

    /// 13.2.5.15 Script data less-than sign state
    ScriptDataLessThanSign,

    /// 13.2.5.16 Script data end tag open state
    ScriptDataEndTagOpen,

    /// 13.2.5.17 Script data end tag name state
    ScriptDataEndTagName,

    /// 13.2.5.18 Script data escape start state
    ScriptDataEscapeStart,

    /// 13.2.5.19 Script data escape start dash state
    ScriptDataEscapeStartDash,

    /// 13.2.5.20 Script data escaped state
    ScriptDataEscaped,

    /// 13.2.5.21 Script data escaped dash state
    ScriptDataEscapedDash,

    /// 13.2.5.22 Script data escaped dash dash state
    ScriptDataEscapedDashDash,

    /// 13.2.5.23 Script data escaped less-than sign state
    ScriptDataEscapedLessThanSign,

    /// 13.2.5.24 Script data escaped end tag open state
    ScriptDataEscapedEndTagOpen,

    /// 13.2.5.25 Script data escaped end tag name state
    ScriptDataEscapedEndTagName,

    /// 13.2.5.26 Script data double escape start state
    ScriptDataDoubleEscapeStart,

    /// 13.2.5.27 Script data double escaped state
    ScriptDataDoubleEscaped,

    /// 13.2.5.28 Script data double escaped dash state
    ScriptDataDoubleEscapedDash,

    /// 13.2.5.29 Script data double escaped dash dash state
    ScriptDataDoubleEscapedDashDash,

    /// 13.2.5.30 Script data double escaped less-than sign state
    ScriptDataDoubleEscapedLessThanSign,

    /// 13.2.5.31 Script data double escape end state
    ScriptDataDoubleEscapeEnd,

    /// 13.2.5.32 Before attribute name state
    BeforeAttributeName,

    /// 13.2.5.33 Attribute name state
    AttributeName,

    /// 13.2.5.34 After attribute name state
    AfterAttributeName,

    /// 13.2.5.35 Before attribute value state
    BeforeAttributeValue,

    /// 13.2.5.36 Attribute value (double-quoted) state
    AttributeValueDoubleQuoted,

    /// 13.2.5.37 Attribute value (single-quoted) state
    AttributeValueSingleQuoted,

    /// 13.2.5.38 Attribute value (unquoted) state
    AttributeValueUnquoted,

    /// 13.2.5.39 After attribute value (quoted) state
    AfterAttributeValueQuoted,

    /// 13.2.5.40 Self-closing start tag state
    SelfClosingStartTag,

    /// 13.2.5.41 Bogus comment state
    BogusComment,

    /// 13.2.5.42 Markup declaration open state
    MarkupDeclarationOpen,

    /// 13.2.5.43 Comment start state
    CommentStart,

    /// 13.2.5.44 Comment start dash state
    CommentStartDash,

    /// 13.2.5.45 Comment state
    Comment,

    /// 13.2.5.46 Comment less-than sign state
    CommentLessThanSign,

    /// 13.2.5.47 Comment less-than sign bang state
    CommentLessThanSignBang,

    /// 13.2.5.48 Comment less-than sign bang dash state
    CommentLessThanSignBangDash,

    /// 13.2.5.49 Comment less-than sign bang dash dash state
    CommentLessThanSignBangDashDash,

    /// 13.2.5.50 Comment end dash state
    CommentEndDash,

    /// 13.2.5.51 Comment end state
    CommentEnd,

    /// 13.2.5.52 Comment end bang state
    CommentEndBang,

    /// 13.2.5.53 DOCTYPE state
    DOCTYPE,

    /// 13.2.5.54 Before DOCTYPE name state
    BeforeDOCTYPEName,

    /// 13.2.5.55 DOCTYPE name state
    DOCTYPEName,

    /// 13.2.5.56 After DOCTYPE name state
    AfterDOCTYPEName,

    /// 13.2.5.57 After DOCTYPE public keyword state
    AfterDOCTYPEPublicKeyword,

    /// 13.2.5.58 Before DOCTYPE public identifier state
    BeforeDOCTYPEPublicIdentifier,

    /// 13.2.5.59 DOCTYPE public identifier (double-quoted) state
    DOCTYPEPublicIdentifierDoubleQuoted,

    /// 13.2.5.60 DOCTYPE public identifier (single-quoted) state
    DOCTYPEPublicIdentifierSingleQuoted,

    /// 13.2.5.61 After DOCTYPE public identifier state
    AfterDOCTYPEPublicIdentifier,

    /// 13.2.5.62 Between DOCTYPE public and system identifiers state
    BetweenDOCTYPEPublicAndSystemIdentifiers,

    /// 13.2.5.63 After DOCTYPE system keyword state
    AfterDOCTYPESystemKeyword,

    /// 13.2.5.64 Before DOCTYPE system identifier state
    BeforeDOCTYPESystemIdentifier,

    /// 13.2.5.65 DOCTYPE system identifier (double-quoted) state
    DOCTYPESystemIdentifierDoubleQuoted,

    /// 13.2.5.66 DOCTYPE system identifier (single-quoted) state
    DOCTYPESystemIdentifierSingleQuoted,

    /// 13.2.5.67 After DOCTYPE system identifier state
    AfterDOCTYPESystemIdentifier,

    /// 13.2.5.68 Bogus DOCTYPE state
    BogusDOCTYPE,

    /// 13.2.5.69 CDATA section state
    CDATASection,

    /// 13.2.5.70 CDATA section bracket state
    CDATASectionBracket,

    /// 13.2.5.71 CDATA section end state
    CDATASectionEnd,

    /// 13.2.5.72 Character reference state
    CharacterReference,

    /// 13.2.5.73 Named character reference state
    NamedCharacterReference,

    /// 13.2.5.74 Ambiguous ampersand state
    AmbiguousAmpersand,

    /// 13.2.5.75 Numeric character reference state
    NumericCharacterReference,

    /// 13.2.5.76 Hexadecimal character reference start state
    HexadecimalCharacterReferenceStart,

    /// 13.2.5.77 Decimal character reference start state
    DecimalCharacterReferenceStart,

    /// 13.2.5.78 Hexadecimal character reference state
    HexadecimalCharacterReference,

    /// 13.2.5.79 Decimal character reference state
    DecimalCharacterReference,

    /// 13.2.5.80 Numeric character reference end state
    NumericCharacterReferenceEnd,
}

impl State {
    /// Returns true for the states that consume the value of an attribute. Character references
    /// found in these states are appended to the attribute value instead of being emitted.
    pub fn is_attribute_value(&self) -> bool {
        matches!(
            self,
            State::AttributeValueDoubleQuoted | State::AttributeValueSingleQuoted | State::AttributeValueUnquoted
        )
    }
}
