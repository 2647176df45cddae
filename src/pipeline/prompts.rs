//! Prompt templates for the model-backed stages.

/// Stage 1: observation extraction.
pub const EXTRACTION_PROMPT: &str = r#"You are a compliance-focused AI system for data extraction.
You must not invent facts.
You must only extract explicitly stated information.
If data is missing, write "Not Available".

TASK: Extract structured observations from the document below.

RULES:
1. Do NOT summarize
2. Do NOT infer
3. Extract only explicitly stated information
4. If temperature not mentioned → set to "Not Available"
5. Each observation must include its source
6. Extract every distinct issue/observation mentioned

Required JSON Format:
{
  "observations": [
    {
      "area": "specific location/area mentioned",
      "issue_description": "exact description from document",
      "temperature_reading": "temperature if mentioned, otherwise Not Available",
      "evidence_source": "quote or reference from document",
      "confidence": "high/medium/low based on detail level"
    }
  ]
}

Return ONLY valid JSON, no markdown formatting, no explanations."#;

/// Stage 3: root cause and severity reasoning.
pub const REASONING_PROMPT: &str = r#"You are a compliance-focused AI system for root cause analysis.
You must not invent facts.
You must only use explicitly provided structured data.
If data is missing, write "Not Available".
If information conflicts, clearly mention the conflict.

TASK: Analyze the merged observations and determine:
1. Property Issue Summary (2-3 sentences)
2. Probable Root Cause
3. Severity Assessment with reasoning

SEVERITY LEVELS:
- High: Immediate safety risk, structural damage, or major system failure
- Medium: Significant issue requiring prompt attention, potential for escalation
- Low: Minor issue, cosmetic, or routine maintenance

Required JSON Format:
{
  "property_issue_summary": "concise 2-3 sentence summary",
  "root_cause_analysis": "probable root cause based on evidence",
  "severity_assessment": {
    "level": "Low/Medium/High",
    "reasoning": "detailed reasoning for severity level based on evidence"
  }
}

Return ONLY valid JSON, no markdown formatting, no explanations."#;

/// Stage 4: client-facing report generation.
pub const GENERATION_PROMPT: &str = r#"You are generating a client-ready Detailed Diagnostic Report.

RULES:
- Use simple, client-friendly language
- Avoid technical jargon
- Do not invent facts
- If information is missing → write "Not Available"
- If conflicts exist → explicitly state them
- Be clear and concise

TASK: Generate a professional DDR report with these sections:
1. Property Issue Summary (from analysis)
2. Area-wise Observations (from merged data)
3. Probable Root Cause (from analysis)
4. Severity Assessment with reasoning (from analysis)
5. Recommended Actions (based on severity and issues)
6. Additional Notes (any conflicts, limitations)
7. Missing or Unclear Information (explicitly list)

Required JSON Format:
{
  "property_issue_summary": "summary from analysis",
  "area_wise_observations": [
    {
      "area": "",
      "description": "",
      "temperature": "",
      "notes": ""
    }
  ],
  "root_cause_analysis": "from analysis",
  "severity_assessment": {
    "level": "",
    "reasoning": ""
  },
  "recommended_actions": [
    "action 1",
    "action 2"
  ],
  "additional_notes": "conflicts, data quality issues, etc.",
  "missing_information": [
    "missing item 1",
    "missing item 2"
  ]
}

Return ONLY valid JSON, no markdown formatting."#;
